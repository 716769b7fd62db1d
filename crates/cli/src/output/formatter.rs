//! Human-readable and JSON output
//!
//! Results go to stdout; errors go to stderr, as a JSON object when `--json`
//! is set.

use console::Style;
use serde::Serialize;

use super::OutputConfig;

/// Styles for the pieces of a transfer report or listing
#[derive(Debug, Clone)]
struct Theme {
    /// Object keys
    key: Style,
    /// Local files
    path: Style,
    /// Byte counts
    size: Style,
    /// Alias, bucket and hook names
    name: Style,
    /// Endpoint URLs
    endpoint: Style,
    /// Secondary facts: region, lookup style, transfer method
    detail: Style,
    success: Style,
    error: Style,
}

impl Theme {
    fn for_config(config: &OutputConfig) -> Self {
        if config.no_color || config.json {
            return Self::plain();
        }
        Self {
            key: Style::new().cyan(),
            path: Style::new().blue(),
            size: Style::new().green(),
            name: Style::new().bold(),
            endpoint: Style::new().cyan().underlined(),
            detail: Style::new().dim(),
            success: Style::new().green(),
            error: Style::new().red(),
        }
    }

    fn plain() -> Self {
        Self {
            key: Style::new(),
            path: Style::new(),
            size: Style::new(),
            name: Style::new(),
            endpoint: Style::new(),
            detail: Style::new(),
            success: Style::new(),
            error: Style::new(),
        }
    }
}

/// Writes command results in the mode selected by the global flags
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
    theme: Theme,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            theme: Theme::for_config(&config),
            config,
        }
    }

    pub fn is_json(&self) -> bool {
        self.config.json
    }

    pub fn style_key(&self, text: &str) -> String {
        self.theme.key.apply_to(text).to_string()
    }

    pub fn style_path(&self, text: &str) -> String {
        self.theme.path.apply_to(text).to_string()
    }

    pub fn style_size(&self, text: &str) -> String {
        self.theme.size.apply_to(text).to_string()
    }

    pub fn style_name(&self, text: &str) -> String {
        self.theme.name.apply_to(text).to_string()
    }

    pub fn style_endpoint(&self, text: &str) -> String {
        self.theme.endpoint.apply_to(text).to_string()
    }

    pub fn style_detail(&self, text: &str) -> String {
        self.theme.detail.apply_to(text).to_string()
    }

    /// Final confirmation line; silent with `--quiet` or `--json`
    pub fn success(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        println!("{} {message}", self.theme.success.apply_to("✓"));
    }

    /// Errors are printed even with `--quiet`
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({ "error": message });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error).unwrap_or_else(|_| message.to_string())
            );
        } else {
            eprintln!("{} {message}", self.theme.error.apply_to("✗"));
        }
    }

    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// A line of human output; silent with `--quiet`
    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        println!("{message}");
    }
}
