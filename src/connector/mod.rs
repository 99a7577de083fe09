//! Connector boundary: named parameters in, a result fragment out.
//!
//! [`Operation::execute`] never fails. Every error is logged and folded into
//! the returned [`OperationResult`], so callers only look at `success`.

mod params;
mod result;

pub use params::*;
pub use result::OperationResult;

use clap::ValueEnum;
use std::fmt;

use crate::archive;
use crate::error::Result;
use crate::ops::{self, ListedEntry};
use crate::pattern::{CaseSensitivity, FilePattern};
use crate::vfs::{FileObject, FileSystemManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Operation {
    Create,
    Append,
    Copy,
    Move,
    Delete,
    Exist,
    Search,
    Archive,
    Unzip,
    #[value(name = "listZip", alias = "list-zip")]
    ListZip,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Append => "append",
            Operation::Copy => "copy",
            Operation::Move => "move",
            Operation::Delete => "delete",
            Operation::Exist => "exist",
            Operation::Search => "search",
            Operation::Archive => "archive",
            Operation::Unzip => "unzip",
            Operation::ListZip => "listZip",
        }
    }

    /// Run the operation against locations resolved through `manager`.
    pub async fn execute(self, manager: &FileSystemManager, params: &Parameters) -> OperationResult {
        tracing::debug!(operation = self.name(), "started");
        match self.run(manager, params).await {
            Ok(result) => {
                tracing::debug!(operation = self.name(), "finished");
                result
            }
            Err(e) if e.is_not_found() => {
                tracing::error!(operation = self.name(), "the location does not exist: {e}");
                OperationResult::failed(e)
            }
            Err(e) => {
                tracing::error!(operation = self.name(), "unable to {}: {e}", self.name());
                OperationResult::failed(e)
            }
        }
    }

    async fn run(self, manager: &FileSystemManager, params: &Parameters) -> Result<OperationResult> {
        let source = manager.resolve(params.require(FILE_LOCATION)?)?;
        let destination = || -> Result<FileObject> {
            manager.resolve(params.require(NEW_FILE_LOCATION)?)
        };
        let pattern = |name: &str| {
            params
                .get(name)
                .map(|p| FilePattern::new(p, CaseSensitivity::Insensitive))
        };

        let result = match self {
            Operation::Create => {
                ops::create(&source, params.get(CONTENT), params.get(ENCODING)).await?;
                OperationResult::succeeded()
            }
            Operation::Append => {
                ops::append(&source, params.require(CONTENT)?, params.get(ENCODING)).await?;
                OperationResult::succeeded()
            }
            Operation::Copy => {
                let file_pattern = pattern(FILE_PATTERN);
                let skipped = ops::copy(&source, &destination()?, file_pattern.as_ref()).await?;
                OperationResult::succeeded().with_skipped(skipped)
            }
            Operation::Move => {
                ops::move_into(&source, &destination()?).await?;
                OperationResult::succeeded()
            }
            Operation::Delete => {
                ops::delete(&source).await?;
                OperationResult::succeeded()
            }
            Operation::Exist => OperationResult {
                file_exist: Some(ops::exists(&source).await?),
                ..OperationResult::succeeded()
            },
            Operation::Search => {
                let found = ops::search(
                    &source,
                    pattern(FILE_PATTERN).as_ref(),
                    pattern(DIR_PATTERN).as_ref(),
                )
                .await?;
                OperationResult::succeeded().with_entries(found)
            }
            Operation::Archive => {
                let report = archive::archive(&source, &destination()?).await?;
                OperationResult::succeeded()
                    .with_entries(report.entries.into_iter().map(ListedEntry::file).collect())
                    .with_skipped(report.skipped)
            }
            Operation::Unzip => {
                let extracted = ops::unzip(&source, &destination()?).await?;
                OperationResult::succeeded().with_entries(extracted)
            }
            Operation::ListZip => {
                let names = ops::list_zip(&source).await?;
                OperationResult::succeeded()
                    .with_entries(names.into_iter().map(ListedEntry::file).collect())
            }
        };
        Ok(result)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
