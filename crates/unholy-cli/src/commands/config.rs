//! Configuration display and editing commands

use colored::Colorize;
use toml_edit::{Item, Value};
use unholy_config::{ConfigStack, Resolved, StackView, document};
use unholy_core::load_project;

use crate::context::CliContext;
use crate::error::Result;

/// A resolved scalar and the layer that supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: String,
}

/// Display the resolved configuration
///
/// Without a project only the core and user layers are shown. `repo` adds
/// the repository Unholyfile, which means reaching the platform.
pub fn run_config_show(ctx: &CliContext, name: Option<&str>, repo: bool) -> Result<()> {
    if let Some(name) = name {
        require_project(ctx, name)?;
    }

    let resolver = ctx.resolver();
    let config = match name {
        Some(name) if repo => {
            let platform = ctx.platform(name)?;
            load_project(&platform, &resolver, name)?.config
        }
        _ => resolver.resolve(name, None)?,
    };

    let title = match name {
        Some(name) => format!("Configuration for {name}"),
        None => "Configuration".to_string(),
    };
    println!("{}", title.bold());
    println!();

    let entries = flatten(&config);
    let width = entries.iter().map(|e| e.key.len()).max().unwrap_or(0);
    for entry in entries {
        println!(
            "  {:<width$}  {}  {}",
            entry.key,
            entry.value,
            format!("({})", entry.source).dimmed(),
        );
    }
    Ok(())
}

/// Set a value in the user Unholyfile, or in a project record
pub fn run_config_set(ctx: &CliContext, project: Option<&str>, key: &str, raw: &str) -> Result<()> {
    let value = parse_value(raw);
    let rendered = value.to_string();

    let path = match project {
        Some(name) => {
            require_project(ctx, name)?;
            ctx.paths().project_config(name)
        }
        None => ctx.paths().user_config(),
    };

    document::edit(&path, project.is_none(), |doc| {
        document::set_path(doc, key, Item::Value(value))
    })?;

    println!(
        "{} Set {} = {} in {}",
        "OK".green().bold(),
        key.cyan(),
        rendered.trim(),
        path.display()
    );
    Ok(())
}

fn require_project(ctx: &CliContext, name: &str) -> Result<()> {
    if ctx.paths().project_exists(name) {
        Ok(())
    } else {
        Err(unholy_core::Error::UnknownProject {
            name: name.to_string(),
        }
        .into())
    }
}

/// TOML when `raw` is a valid TOML value, otherwise a plain string.
fn parse_value(raw: &str) -> Value {
    match raw.parse::<Value>() {
        Ok(mut value) => {
            value.decor_mut().clear();
            value
        }
        Err(_) => Value::from(raw),
    }
}

/// Every scalar in the stack as a dotted key, sorted by key.
pub fn flatten(config: &ConfigStack) -> Vec<ConfigEntry> {
    let mut entries = Vec::new();
    flatten_view(&config.view(), "", &mut entries);
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    entries
}

fn flatten_view(view: &StackView<'_>, prefix: &str, out: &mut Vec<ConfigEntry>) {
    for key in view.keys() {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };
        match view.lookup(key) {
            Some(Resolved::Scalar { source, item }) => {
                let value = match item.as_value() {
                    Some(value) => value.clone().decorated("", "").to_string(),
                    None => item.to_string().trim().to_string(),
                };
                out.push(ConfigEntry {
                    key: path,
                    value,
                    source: source.to_string(),
                });
            }
            Some(Resolved::Section(nested)) => flatten_view(&nested, &path, out),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use unholy_config::{ConfigPaths, ConfigResolver};

    #[test]
    fn test_parse_value_prefers_toml() {
        assert_eq!(parse_value("3").as_integer(), Some(3));
        assert_eq!(parse_value("true").as_bool(), Some(true));
        assert_eq!(parse_value("\"quoted\"").as_str(), Some("quoted"));
        assert_eq!(parse_value("/bin/zsh").as_str(), Some("/bin/zsh"));
        assert_eq!(parse_value("img:1").as_str(), Some("img:1"));
        assert!(parse_value("[1, 2]").is_array());
    }

    #[test]
    fn test_flatten_reports_winning_layer() {
        let temp = TempDir::new().unwrap();
        let resolver = ConfigResolver::new(ConfigPaths::new(temp.path()))
            .with_core("---\nrepository = \"x\"\n[dev]\nimage = \"a\" # core\nvolume = \"v\"\n---\n");
        let config = resolver
            .resolve(None, Some("---\n[dev]\nimage = \"b\"\n---\n".into()))
            .unwrap();

        let entries = flatten(&config);

        assert_eq!(
            entries,
            vec![
                ConfigEntry {
                    key: "dev.image".into(),
                    value: "\"b\"".into(),
                    source: "repo".into(),
                },
                ConfigEntry {
                    key: "dev.volume".into(),
                    value: "\"v\"".into(),
                    source: "core".into(),
                },
                ConfigEntry {
                    key: "repository".into(),
                    value: "\"x\"".into(),
                    source: "core".into(),
                },
            ]
        );
    }
}
