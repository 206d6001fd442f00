//! Courses command implementation.

use super::open_store;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the courses command.
pub async fn run_courses(settings: Settings) -> Result<()> {
    preflight::check(Operation::Catalog)?;
    let store = open_store(&settings)?;

    match store.existing_course_titles().await {
        Ok(titles) if titles.is_empty() => {
            Output::info("No courses indexed yet. Use 'syllabus index <folder>' to add some.");
        }
        Ok(titles) => {
            Output::header(&format!("Indexed Courses ({})", titles.len()));
            println!();
            for title in &titles {
                Output::list_item(title);
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list courses: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
