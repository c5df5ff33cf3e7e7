//! Slash commands typed into the query input.
//!
//! - /upload <files..>
//! - /upload-inc <files..>
//! - /delete <doc_id>
//! - /refresh
//! - /docs
//! - /help

use std::path::PathBuf;

use color_eyre::eyre::{eyre, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum SlashCommand {
    /// Upload to the initial ingest endpoint
    Upload(Vec<PathBuf>),
    /// Upload to the incremental ingest endpoint
    UploadIncremental(Vec<PathBuf>),
    /// Delete a document by doc_id
    Delete(String),
    /// Refetch the knowledge graph
    Refresh,
    /// Reload the document list
    Docs,
    Help,
}

impl SlashCommand {
    /// Whether `input` should be parsed as a command rather than sent as a query.
    pub fn is_command(input: &str) -> bool {
        input.trim_start().starts_with('/')
    }

    /// Parse a slash command from input string
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let Some(body) = trimmed.strip_prefix('/') else {
            return Err(eyre!("Not a slash command (must start with /)"));
        };

        let parts: Vec<&str> = body.split_whitespace().collect();
        let Some((command, args)) = parts.split_first() else {
            return Err(eyre!("Empty command"));
        };
        let command = command.to_lowercase();

        match command.as_str() {
            "upload" | "upload-inc" => {
                if args.is_empty() {
                    return Err(eyre!("Missing argument: /{} <files..>", command));
                }
                let files = args.iter().map(PathBuf::from).collect();
                if command == "upload" {
                    Ok(SlashCommand::Upload(files))
                } else {
                    Ok(SlashCommand::UploadIncremental(files))
                }
            }
            "delete" | "rm" => match args {
                [doc_id] => Ok(SlashCommand::Delete(doc_id.to_string())),
                [] => Err(eyre!("Missing argument: /delete <doc_id>")),
                _ => Err(eyre!("/delete takes exactly one doc_id")),
            },
            "refresh" => no_args(args, "refresh", SlashCommand::Refresh),
            "docs" => no_args(args, "docs", SlashCommand::Docs),
            "help" => no_args(args, "help", SlashCommand::Help),
            _ => Err(eyre!(
                "Unknown command: /{}. Type /help for available commands.",
                command
            )),
        }
    }

    pub fn help_lines() -> &'static [(&'static str, &'static str)] {
        &[
            ("/upload <files..>", "Upload .txt/.csv files"),
            ("/upload-inc <files..>", "Upload incrementally"),
            ("/delete <doc_id>", "Delete a document"),
            ("/refresh", "Refetch the knowledge graph"),
            ("/docs", "Reload the document list"),
            ("/help", "Show this help"),
        ]
    }
}

fn no_args(args: &[&str], name: &str, command: SlashCommand) -> Result<SlashCommand> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(eyre!("/{} takes no arguments", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload() {
        let cmd = SlashCommand::parse("/upload a.txt data/b.csv").unwrap();
        assert_eq!(
            cmd,
            SlashCommand::Upload(vec![PathBuf::from("a.txt"), PathBuf::from("data/b.csv")])
        );
    }

    #[test]
    fn test_parse_upload_incremental() {
        let cmd = SlashCommand::parse("/upload-inc notes.txt").unwrap();
        assert_eq!(
            cmd,
            SlashCommand::UploadIncremental(vec![PathBuf::from("notes.txt")])
        );
    }

    #[test]
    fn test_parse_delete() {
        let cmd = SlashCommand::parse("/delete doc-42").unwrap();
        assert_eq!(cmd, SlashCommand::Delete("doc-42".to_string()));
        assert!(SlashCommand::parse("/delete a b").is_err());
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(SlashCommand::parse("/refresh").unwrap(), SlashCommand::Refresh);
        assert_eq!(SlashCommand::parse("  /DOCS ").unwrap(), SlashCommand::Docs);
        assert_eq!(SlashCommand::parse("/help").unwrap(), SlashCommand::Help);
        assert!(SlashCommand::parse("/refresh now").is_err());
    }

    #[test]
    fn test_parse_unknown_command() {
        assert!(SlashCommand::parse("/unknown").is_err());
        assert!(SlashCommand::parse("/").is_err());
    }

    #[test]
    fn test_parse_missing_arguments() {
        assert!(SlashCommand::parse("/upload").is_err());
        assert!(SlashCommand::parse("/delete").is_err());
    }

    #[test]
    fn test_not_slash_command() {
        assert!(!SlashCommand::is_command("what is /upload?"));
        assert!(SlashCommand::parse("upload a.txt").is_err());
    }
}
