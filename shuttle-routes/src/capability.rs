//! Checks for the external programs the OCR collaborator shells out to.
//!
//! The pipeline consults [`check_ocr`] before the `ocr` stage; `shuttle-routes doctor`
//! prints the same result.

use std::fmt;
use std::process::{Command, Stdio};

use serde::Serialize;
use tracing::{debug, warn};

/// Program name and the argument that makes it print its version and exit.
const OCR_TOOLS: &[(&str, &str)] = &[("tesseract", "--version"), ("pdftoppm", "-v")];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "missing", rename_all = "lowercase")]
pub enum Capability {
    Ready,
    Missing(Vec<String>),
}

impl Capability {
    pub fn is_ready(&self) -> bool {
        matches!(self, Capability::Ready)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Ready => f.write_str("ready"),
            Capability::Missing(tools) => write!(f, "missing {}", tools.join(", ")),
        }
    }
}

pub fn check_ocr() -> Capability {
    check_tools(OCR_TOOLS)
}

/// A tool counts as present when it can be spawned at all; its exit status is ignored.
pub fn check_tools(tools: &[(&str, &str)]) -> Capability {
    let missing: Vec<String> = tools
        .iter()
        .filter(|(program, flag)| {
            let found = Command::new(program)
                .arg(flag)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok();
            debug!(program, found, "Probed external tool");
            !found
        })
        .map(|(program, _)| program.to_string())
        .collect();

    if missing.is_empty() {
        Capability::Ready
    } else {
        warn!(?missing, "External tools missing");
        Capability::Missing(missing)
    }
}
