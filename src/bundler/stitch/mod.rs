//! Turning bundler chunks back into per-file artifacts.
//!
//! The shared chunk becomes the content of the own package's placeholder
//! file, entry chunks become the content of their entry files, and every
//! other input gets an empty artifact. Which prelude wraps a chunk is decided
//! by the platform's [`PlatformCapabilities`], not by inspecting the tag.

pub mod templates;

use crate::bundler::{
    artifact::BuiltArtifact,
    config::BundleConfig,
    error::{Error, Result},
    input::{FileInfo, FileKind},
    settings::{PlatformCapabilities, Settings},
    utils::fs,
};
use handlebars::Handlebars;
use regex::{NoExpand, Regex};
use std::collections::BTreeMap;
use templates::{ENTRY_LINK, ENTRY_LINK_TEMPLATE, SHARED_NAMESPACE, SHARED_NAMESPACE_TEMPLATE};

/// Wraps chunks for one platform.
pub struct Stitcher<'a> {
    settings: &'a Settings,
    capabilities: PlatformCapabilities,
    handlebars: Handlebars<'static>,
    global: Regex,
}

impl<'a> Stitcher<'a> {
    /// Prepares the templates for a platform with `capabilities`.
    pub fn new(settings: &'a Settings, capabilities: PlatformCapabilities) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string(SHARED_NAMESPACE, SHARED_NAMESPACE_TEMPLATE)
            .map_err(|e| Error::Template(format!("failed to register {}: {}", SHARED_NAMESPACE, e)))?;
        handlebars
            .register_template_string(ENTRY_LINK, ENTRY_LINK_TEMPLATE)
            .map_err(|e| Error::Template(format!("failed to register {}: {}", ENTRY_LINK, e)))?;

        let global = Regex::new(&format!(r"\b{}\b", regex::escape(settings.browser_global())))
            .map_err(|e| Error::GenericError(format!("invalid browser global pattern: {}", e)))?;

        Ok(Self {
            settings,
            capabilities,
            handlebars,
            global,
        })
    }

    /// Artifact text for the shared placeholder.
    ///
    /// Without an ambient global the namespace is declared first and any
    /// reference to the browser global is redirected to it.
    pub fn shared_artifact(&self, chunk: &str) -> Result<String> {
        if self.capabilities.ambient_global {
            return Ok(chunk.to_string());
        }
        let rewritten = self.global.replace_all(chunk, NoExpand(self.settings.namespace()));
        self.render(SHARED_NAMESPACE, &rewritten)
    }

    /// Artifact text for an entry chunk.
    pub fn entry_artifact(&self, chunk: &str) -> Result<String> {
        if self.capabilities.links_shared_namespace {
            return Ok(chunk.to_string());
        }
        self.render(ENTRY_LINK, chunk)
    }

    fn render(&self, template: &str, chunk: &str) -> Result<String> {
        let own_package = self.settings.own_package().to_string();
        let mut data = BTreeMap::new();
        data.insert("namespace", self.settings.namespace());
        data.insert("own_package", own_package.as_str());
        data.insert("chunk", chunk);
        self.handlebars
            .render(template, &data)
            .map_err(|e| Error::Template(format!("failed to render {}: {}", template, e)))
    }

    /// Produces one artifact per file, in input order.
    ///
    /// When `config` registers no entries the bundler was not run; the
    /// placeholder is then stitched from an empty shared chunk.
    pub async fn stitch(
        &self,
        files: &[FileInfo<'_>],
        config: &BundleConfig,
    ) -> Result<Vec<BuiltArtifact>> {
        let mut shared_chunk: Option<String> = None;
        let mut artifacts = Vec::with_capacity(files.len());

        for file in files {
            let data = match file.kind {
                FileKind::SharedPlaceholder => {
                    if shared_chunk.is_none() {
                        shared_chunk = Some(if config.entry.is_empty() {
                            String::new()
                        } else {
                            fs::read_to_string(&config.shared_chunk_path()).await?
                        });
                    }
                    self.shared_artifact(shared_chunk.as_deref().unwrap_or_default())?
                }
                FileKind::Entry => {
                    let chunk = fs::read_to_string(&config.entry_chunk_path(&file.staged_path)).await?;
                    self.entry_artifact(&chunk)?
                }
                FileKind::Module | FileKind::Unsupported => {
                    artifacts.push(BuiltArtifact::empty(file.file_name, file.source_path()));
                    continue;
                }
            };
            artifacts.push(BuiltArtifact {
                path: file.file_name.to_string(),
                data,
                source_path: file.source_path(),
                source_map: None,
            });
        }

        Ok(artifacts)
    }
}
