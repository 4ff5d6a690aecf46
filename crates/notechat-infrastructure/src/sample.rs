//! The bundled sample document shown when no session has been saved.

const SAMPLE_MARKDOWN: &str = r#"# Session: Developer Copilot

Welcome to your coding session. Select any passage below and ask a question
about it, or open the chat tab to talk about the whole document.

## Features

- Markdown rendering with syntax highlighted code blocks
- Select text to ask a focused question
- Conversation history that survives restarts

## Python

```python
def fibonacci(n):
    if n <= 1:
        return n
    return fibonacci(n - 1) + fibonacci(n - 2)

for i in range(10):
    print(fibonacci(i))
```

## Bash

```bash
#!/bin/bash
for file in *.md; do
    echo "Processing $file"
    wc -l "$file"
done
```

## JSON

```json
{
  "name": "developer-copilot",
  "version": "1.0.0",
  "features": ["markdown", "chat", "questions"]
}
```

## Diff

```diff
- const total = items.reduce((sum, item) => sum + item.price, 0)
+ const total = items.reduce((sum, item) => sum + item.price * item.quantity, 0)
```
"#;

/// Returns the sample markdown document.
pub fn load_sample_markdown() -> &'static str {
    SAMPLE_MARKDOWN
}
