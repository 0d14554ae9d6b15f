//! webpack command-line driver.
//!
//! Renders `webpack.config.js` into the staging root, runs
//! `webpack --config webpack.config.js --json` there, and reads compile
//! errors from the JSON stats printed on stdout.

use super::{BundleTool, attribute_diagnostics, verify_outputs};
use crate::bail;
use crate::bundler::{
    builder::tool_detection::resolve_tool,
    config::BundleConfig,
    error::{CompileDiagnostic, Error, Result},
    install::OutputSink,
    settings::WebpackSettings,
    utils::{fs, process::run_streamed},
};
use handlebars::Handlebars;
use serde_json::Value;
use std::{collections::BTreeMap, path::Path};
use tokio::process::Command;

const CONFIG_TEMPLATE: &str = r#"// Generated for one platform batch. Changes are overwritten.
var webpack = require('webpack');

module.exports = {
    entry: {{entry}},
    output: {{output}},
    plugins: [
        new webpack.optimize.CommonsChunkPlugin({{shared_chunk}})
    ],
    resolve: {{resolve}}
};
"#;

/// Runs the webpack CLI found for each staging root.
#[derive(Debug, Clone, Default)]
pub struct WebpackCli {
    settings: WebpackSettings,
}

impl WebpackCli {
    /// Creates a driver.
    pub fn new(settings: WebpackSettings) -> Self {
        Self { settings }
    }
}

/// Renders the webpack config module for `config`.
pub fn render_config(config: &BundleConfig) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let mut data = BTreeMap::new();
    data.insert("entry", indented(&config.entry)?);
    data.insert("output", indented(&config.output)?);
    data.insert("resolve", indented(&config.resolve)?);
    data.insert("shared_chunk", serde_json::to_string(&config.shared_chunk)?);

    handlebars
        .register_template_string("webpack.config.js", CONFIG_TEMPLATE)
        .map_err(|e| Error::Template(format!("failed to register webpack config: {}", e)))?;
    handlebars
        .render("webpack.config.js", &data)
        .map_err(|e| Error::Template(format!("failed to render webpack config: {}", e)))
}

fn indented<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?.replace('\n', "\n    "))
}

/// Extracts error messages from `webpack --json` output.
///
/// webpack 1 to 4 report errors as strings; newer releases report objects
/// with `message` and, where known, `moduleName`.
pub fn parse_stats(stdout: &str) -> Result<Vec<String>> {
    let stats: Value = serde_json::from_str(stdout.trim())?;
    let errors = match stats.get("errors") {
        Some(Value::Array(errors)) => errors,
        _ => return Ok(Vec::new()),
    };
    Ok(errors
        .iter()
        .map(|error| match error {
            Value::String(message) => message.clone(),
            Value::Object(object) => {
                let message = object
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                match object.get("moduleName").and_then(Value::as_str) {
                    Some(module) => format!("ERROR in {}\n{}", module, message),
                    None => message.to_string(),
                }
            }
            other => other.to_string(),
        })
        .collect())
}

impl BundleTool for WebpackCli {
    async fn bundle(
        &self,
        config: &BundleConfig,
        staging_root: &Path,
        sink: &dyn OutputSink,
    ) -> Result<()> {
        let config_path = staging_root.join(&self.settings.config_file);
        fs::write_file(&config_path, render_config(config)?).await?;
        log::debug!("Wrote {}", config_path.display());

        let program = resolve_tool(
            "webpack",
            self.settings.program.as_deref(),
            Some(staging_root),
        )?;
        let mut command = Command::new(&program);
        command
            .arg("--config")
            .arg(&self.settings.config_file)
            .arg("--json")
            .current_dir(staging_root);

        let output = run_streamed(command, "webpack", sink, true).await?;

        let messages = match parse_stats(&output.stdout) {
            Ok(messages) => messages,
            Err(e) if output.status.success() => {
                bail!("could not read webpack stats: {}", e);
            }
            Err(_) => output.stderr_tail.clone(),
        };

        if !messages.is_empty() {
            return Err(Error::CompileFailed {
                diagnostics: attribute_diagnostics(messages, config),
            });
        }
        if !output.status.success() {
            let mut message = format!("webpack exited with {}", output.status);
            if !output.stderr_tail.is_empty() {
                message.push('\n');
                message.push_str(&output.stderr_tail.join("\n"));
            }
            return Err(Error::CompileFailed {
                diagnostics: vec![CompileDiagnostic {
                    message,
                    source_path: None,
                }],
            });
        }

        verify_outputs(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn renders_entries_fallbacks_and_commons_chunk() {
        let mut config =
            BundleConfig::new(Path::new("/stage/os"), "shared-modules.js", Some("RocketModule".into()));
        config.add_entry("acme_widgets/module.js");
        config.add_fallback(PathBuf::from("/stage/os/node_modules/acme_widgets/node_modules"));

        let rendered = render_config(&config).unwrap();
        assert!(rendered.contains("var webpack = require('webpack');"));
        assert!(rendered.contains(
            r#""acme_widgets/module.js": "./packages/acme_widgets/module.js""#
        ));
        assert!(rendered.contains(r#""globalObject": "RocketModule""#));
        assert!(rendered.contains("/stage/os/node_modules/acme_widgets/node_modules"));
        assert!(rendered.contains(r#"new webpack.optimize.CommonsChunkPlugin("shared-modules.js")"#));
        assert!(!rendered.contains("&quot;"));
    }

    #[test]
    fn parses_string_and_object_errors() {
        let stats = r#"{
            "errors": [
                "./packages/acme_widgets/module.js\nModule parse failed: Unexpected token",
                { "message": "Can't resolve 'lodash'", "moduleName": "./packages/__app__/module.js" },
                { "message": "Entry module not found" }
            ],
            "warnings": []
        }"#;
        let messages = parse_stats(stats).unwrap();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].starts_with("./packages/acme_widgets/module.js"));
        assert_eq!(
            messages[1],
            "ERROR in ./packages/__app__/module.js\nCan't resolve 'lodash'"
        );
        assert_eq!(messages[2], "Entry module not found");
    }

    #[test]
    fn clean_stats_have_no_errors() {
        assert!(parse_stats(r#"{"errors":[],"hash":"abc"}"#).unwrap().is_empty());
        assert!(parse_stats(r#"{"hash":"abc"}"#).unwrap().is_empty());
        assert!(parse_stats("not json").is_err());
    }

    #[cfg(unix)]
    mod webpack_process {
        use super::*;
        use crate::bundler::install::NullSink;
        use std::os::unix::fs::PermissionsExt;

        struct Fixture {
            _tmp: tempfile::TempDir,
            root: PathBuf,
            stats: PathBuf,
            config: BundleConfig,
        }

        fn fixture() -> Fixture {
            let tmp = tempfile::tempdir().unwrap();
            let root = tmp.path().join("stage");
            std::fs::create_dir_all(root.join("built")).unwrap();
            let mut config = BundleConfig::new(&root, "shared-modules.js", None);
            config.add_entry("acme_widgets/module.js");
            let stats = tmp.path().join("stats.json");
            Fixture {
                _tmp: tmp,
                root,
                stats,
                config,
            }
        }

        /// Installs an executable `sh` script as the webpack binary.
        fn stub_webpack(fixture: &Fixture, body: &str) -> WebpackCli {
            let path = fixture.root.parent().unwrap().join("webpack");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            WebpackCli::new(WebpackSettings {
                program: Some(path),
                ..Default::default()
            })
        }

        #[tokio::test]
        async fn successful_run_writes_config_and_checks_chunks() {
            let fixture = fixture();
            let webpack = stub_webpack(
                &fixture,
                "echo \"$@\" > args.txt\n\
                 mkdir -p built/acme_widgets\n\
                 echo shared > built/shared-modules.js\n\
                 echo entry > built/acme_widgets/module.js\n\
                 echo '{\"errors\":[]}'",
            );

            webpack
                .bundle(&fixture.config, &fixture.root, &NullSink)
                .await
                .unwrap();

            assert!(fixture.root.join("webpack.config.js").is_file());
            let args = std::fs::read_to_string(fixture.root.join("args.txt")).unwrap();
            assert_eq!(args.trim(), "--config webpack.config.js --json");
        }

        #[tokio::test]
        async fn stats_errors_become_attributed_compile_failures() {
            let fixture = fixture();
            std::fs::write(
                &fixture.stats,
                r#"{"errors":["./packages/acme_widgets/module.js\nModule parse failed: Unexpected token (1:14)"]}"#,
            )
            .unwrap();
            let webpack = stub_webpack(&fixture, &format!("cat '{}'; exit 2", fixture.stats.display()));

            match webpack.bundle(&fixture.config, &fixture.root, &NullSink).await {
                Err(Error::CompileFailed { diagnostics }) => {
                    assert_eq!(diagnostics.len(), 1);
                    assert!(diagnostics[0].message.contains("Module parse failed"));
                    assert_eq!(
                        diagnostics[0].source_path.as_deref(),
                        Some("acme:widgets/module.js")
                    );
                }
                other => panic!("expected compile failure, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn unreadable_stats_after_success_is_an_error() {
            let fixture = fixture();
            let webpack = stub_webpack(&fixture, "echo 'Hash: 1f2e3d'; exit 0");

            match webpack.bundle(&fixture.config, &fixture.root, &NullSink).await {
                Err(Error::GenericError(message)) => {
                    assert!(message.starts_with("could not read webpack stats"));
                }
                other => panic!("expected stats error, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn crash_without_stats_reports_stderr_tail() {
            let fixture = fixture();
            let webpack = stub_webpack(
                &fixture,
                "echo \"Error: Cannot find module 'webpack'\" >&2; exit 3",
            );

            match webpack.bundle(&fixture.config, &fixture.root, &NullSink).await {
                Err(Error::CompileFailed { diagnostics }) => {
                    assert_eq!(diagnostics.len(), 1);
                    assert_eq!(diagnostics[0].message, "Error: Cannot find module 'webpack'");
                    assert_eq!(diagnostics[0].source_path, None);
                }
                other => panic!("expected compile failure, got {:?}", other),
            }
        }
    }
}
