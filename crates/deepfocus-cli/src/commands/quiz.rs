use clap::Subcommand;
use deepfocus_core::quiz::{FallbackQuizSource, GeminiQuizSource, QuizSource};
use deepfocus_core::SkillGraph;

#[derive(Subcommand)]
pub enum QuizAction {
    /// Generate active-recall questions for a node or ad-hoc topic
    Generate {
        /// Node id from the skill tree (overrides title/description)
        #[arg(long)]
        node: Option<String>,
        #[arg(long, default_value = "Untitled")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Media duration in seconds
        #[arg(long, default_value = "600")]
        duration: u32,
        /// Skip the Gemini collaborator and use the fallback list
        #[arg(long)]
        offline: bool,
    },
}

pub fn run(action: QuizAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        QuizAction::Generate {
            node,
            title,
            description,
            duration,
            offline,
        } => {
            let (title, description, duration) = match node {
                Some(id) => {
                    let graph = SkillGraph::default_catalog();
                    let node = graph
                        .get(&id)
                        .ok_or_else(|| format!("unknown node id: {id}"))?;
                    (node.title.clone(), node.description.clone(), node.duration_secs)
                }
                None => (title, description, duration),
            };

            // Gemini needs GEMINI_API_KEY; anything else gets the fallback.
            let source: Box<dyn QuizSource> = if offline {
                Box::new(FallbackQuizSource)
            } else {
                match GeminiQuizSource::from_env() {
                    Ok(gemini) => Box::new(gemini),
                    Err(_) => Box::new(FallbackQuizSource),
                }
            };
            let questions = source.generate_quiz(&title, &description, duration);
            println!("{}", serde_json::to_string_pretty(&questions)?);
        }
    }
    Ok(())
}
