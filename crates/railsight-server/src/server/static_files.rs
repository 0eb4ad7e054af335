//! Built-in index page, used when the view directory has no `index.html`

pub const FALLBACK_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Railsight</title>
</head>
<body>
    <h1>Railsight</h1>
    <p>Upload a photo of a train to classify it.</p>
    <form id="upload" enctype="multipart/form-data">
        <input type="file" name="file" accept="image/*" required>
        <button type="submit">Analyze</button>
    </form>
    <pre id="result"></pre>
    <script>
        document.getElementById('upload').addEventListener('submit', async (event) => {
            event.preventDefault();
            const output = document.getElementById('result');
            output.textContent = 'Analyzing...';
            try {
                const response = await fetch('/analyze', {
                    method: 'POST',
                    body: new FormData(event.target),
                });
                const body = await response.json();
                output.textContent = response.ok ? body.result : body.error.message;
            } catch (err) {
                output.textContent = 'Request failed: ' + err;
            }
        });
    </script>
</body>
</html>
"#;
