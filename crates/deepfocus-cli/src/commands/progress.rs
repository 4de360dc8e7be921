use clap::Subcommand;
use deepfocus_core::progress::{ProgressState, ProgressStore};
use deepfocus_core::storage::ProgressDb;

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Print the current progress state as JSON
    Show,
    /// Completion statistics
    Stats,
    /// Completion history, most recent first
    History,
    /// Reset progress to a fresh state
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: ProgressAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = ProgressDb::open()?;
    match action {
        ProgressAction::Show => {
            let state = db.load()?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        ProgressAction::Stats => {
            let stats = db.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        ProgressAction::History => {
            for record in db.completions()? {
                println!(
                    "{}  {:6} +{} EXP  [{}]",
                    record.completed_at.format("%Y-%m-%d %H:%M"),
                    record.node_id,
                    record.exp_awarded,
                    record.subject
                );
            }
        }
        ProgressAction::Reset { yes } => {
            if !yes {
                return Err("pass --yes to confirm resetting all progress".into());
            }
            db.save(&ProgressState::default())?;
            println!("Progress reset.");
        }
    }
    Ok(())
}
