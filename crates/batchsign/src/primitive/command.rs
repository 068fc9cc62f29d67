/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Signature primitive backed by external signing tools.
//!
//! Both steps run a command built from a [`CommandTemplate`]. Arguments may
//! contain the placeholders `{file}`, `{file_digest}`, `{signature_digest}`,
//! `{certificate}`, `{key_vault}` and `{timestamp_url}`. The access token is
//! handed to the signing command in the [`ACCESS_TOKEN_ENV`] environment
//! variable and never appears on a command line.
//!
//! Child processes are killed if the attempt driving them is cancelled.

use async_trait::async_trait;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;
use url::Url;

use super::{PackageHandle, PackageSignaturePrimitive, SignatureHandle, TimestampOutcome};
use crate::configuration::SigningConfiguration;
use crate::digest::DigestAlgorithm;
use crate::error::PrimitiveError;

/// Environment variable carrying the access token to the signing command.
pub const ACCESS_TOKEN_ENV: &str = "BATCHSIGN_ACCESS_TOKEN";

/// An external command with placeholder arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandTemplate {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Substitutes `{name}` placeholders in every argument.
    ///
    /// Each argument is scanned once, so a substituted value that itself
    /// looks like a placeholder is left as is. Unknown placeholders are kept.
    pub fn render(&self, vars: &[(&str, String)]) -> Result<Vec<String>, PrimitiveError> {
        let placeholder = Regex::new(r"\{([a-z_]+)\}")
            .map_err(|e| PrimitiveError::InvalidTemplate(e.to_string()))?;

        Ok(self
            .args
            .iter()
            .map(|arg| {
                placeholder
                    .replace_all(arg, |caps: &Captures| {
                        vars.iter()
                            .find(|(name, _)| *name == &caps[1])
                            .map(|(_, value)| value.clone())
                            .unwrap_or_else(|| caps[0].to_string())
                    })
                    .into_owned()
            })
            .collect())
    }

    async fn run(
        &self,
        vars: &[(&str, String)],
        env: Option<(&str, &str)>,
    ) -> Result<Output, PrimitiveError> {
        let args = self.render(vars)?;
        debug!(program = %self.program, args = ?args, "Running external signing tool");

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some((key, value)) = env {
            command.env(key, value);
        }

        Ok(command.output().await?)
    }
}

/// Delegates signing and timestamping to external tools.
#[derive(Debug, Clone)]
pub struct CommandSignaturePrimitive {
    sign: CommandTemplate,
    timestamp: Option<CommandTemplate>,
}

impl CommandSignaturePrimitive {
    pub fn new(sign: CommandTemplate, timestamp: Option<CommandTemplate>) -> Self {
        Self { sign, timestamp }
    }
}

#[async_trait]
impl PackageSignaturePrimitive for CommandSignaturePrimitive {
    async fn open_for_signing(
        &self,
        path: &Path,
    ) -> Result<Box<dyn PackageHandle>, PrimitiveError> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(PrimitiveError::InvalidPackage(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        // Fails when the file is read-only or locked by another process.
        tokio::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .await?;

        Ok(Box::new(CommandPackage {
            path: path.to_path_buf(),
            sign: self.sign.clone(),
            timestamp: self.timestamp.clone(),
        }))
    }
}

struct CommandPackage {
    path: PathBuf,
    sign: CommandTemplate,
    timestamp: Option<CommandTemplate>,
}

#[async_trait]
impl PackageHandle for CommandPackage {
    async fn sign_with_preset(
        &mut self,
        configuration: &SigningConfiguration,
    ) -> Result<Box<dyn SignatureHandle>, PrimitiveError> {
        let vars = vec![
            ("file", self.path.display().to_string()),
            (
                "file_digest",
                configuration.file_digest_algorithm().to_string(),
            ),
            (
                "signature_digest",
                configuration.signature_digest_algorithm().to_string(),
            ),
            ("certificate", configuration.certificate_name().to_string()),
            ("key_vault", configuration.key_vault_location().to_string()),
        ];

        let output = self
            .sign
            .run(
                &vars,
                Some((ACCESS_TOKEN_ENV, configuration.access_token().secret())),
            )
            .await?;
        if !output.status.success() {
            return Err(command_failed(&self.sign, &output));
        }

        Ok(Box::new(CommandSignature {
            path: self.path.clone(),
            timestamp: self.timestamp.clone(),
        }))
    }
}

struct CommandSignature {
    path: PathBuf,
    timestamp: Option<CommandTemplate>,
}

#[async_trait]
impl SignatureHandle for CommandSignature {
    async fn timestamp(
        &mut self,
        url: &Url,
        digest: DigestAlgorithm,
    ) -> Result<TimestampOutcome, PrimitiveError> {
        let template = self.timestamp.as_ref().ok_or_else(|| {
            PrimitiveError::NotConfigured("no timestamp command for timestamp URL".into())
        })?;

        let vars = vec![
            ("file", self.path.display().to_string()),
            ("timestamp_url", url.to_string()),
            ("file_digest", digest.to_string()),
        ];
        let output = template.run(&vars, None).await?;

        if output.status.success() {
            Ok(TimestampOutcome::Success)
        } else {
            debug!(
                path = %self.path.display(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Timestamp authority rejected the signature"
            );
            Ok(TimestampOutcome::Failed)
        }
    }
}

fn command_failed(template: &CommandTemplate, output: &Output) -> PrimitiveError {
    PrimitiveError::CommandFailed {
        program: template.program.clone(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}
