use promptboard_core::preferences::PreferenceBackend;
use promptboard_core::remote::RemoteCollection;
use promptboard_core::{Category, PromptBoard, PromptDraft};

use crate::commands::common::{normalize_content, read_piped_stdin};
use crate::error::CliError;

pub async fn run_submit<R, B>(
    board: &PromptBoard<R, B>,
    title: &str,
    content: Option<&str>,
    author: &str,
    category: Category,
) -> Result<(), CliError>
where
    R: RemoteCollection,
    B: PreferenceBackend,
{
    let content = match content.and_then(normalize_content) {
        Some(content) => content,
        None => read_piped_stdin()?.unwrap_or_default(),
    };

    let mut draft = PromptDraft::new(title, content, author, Some(category));
    let id = board.submit(&mut draft).await?;
    println!("{id}");
    Ok(())
}
