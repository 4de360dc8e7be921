use clap::Subcommand;
use deepfocus_core::progress::ProgressStore;
use deepfocus_core::storage::ProgressDb;
use deepfocus_core::SkillGraph;

#[derive(Subcommand)]
pub enum TreeAction {
    /// List all nodes grouped by subject with lock/completion markers
    List {
        /// Restrict to one subject
        #[arg(long)]
        subject: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single node
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// List nodes that can never unlock (missing or cyclic prerequisites)
    Doctor,
}

pub fn run(action: TreeAction) -> Result<(), Box<dyn std::error::Error>> {
    let graph = SkillGraph::default_catalog();
    let db = ProgressDb::open()?;
    let progress = db.load()?;

    match action {
        TreeAction::List { subject, json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&graph)?);
                return Ok(());
            }
            for (name, nodes) in graph.nodes_by_subject() {
                if let Some(filter) = &subject {
                    if &name != filter {
                        continue;
                    }
                }
                println!("{name}");
                for node in nodes {
                    let marker = if graph.is_completed(node, &progress) {
                        "done"
                    } else if graph.is_unlocked(node, &progress) {
                        "open"
                    } else {
                        "locked"
                    };
                    println!(
                        "  [{marker:>6}] {:6} L{} {} ({}s)",
                        node.id, node.level, node.title, node.duration_secs
                    );
                }
            }
        }
        TreeAction::Show { id, json } => {
            let node = graph
                .get(&id)
                .ok_or_else(|| format!("unknown node id: {id}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(node)?);
                return Ok(());
            }
            println!("{} - {}", node.id, node.title);
            println!("  subject:       {} (level {})", node.subject, node.level);
            println!("  media:         {} ({}s)", node.media_ref, node.duration_secs);
            println!("  prerequisites: {:?}", node.prerequisites);
            println!("  unlocked:      {}", graph.is_unlocked(node, &progress));
            println!("  completed:     {}", graph.is_completed(node, &progress));
            println!("  {}", node.description);
        }
        TreeAction::Doctor => {
            let unreachable = graph.unreachable_nodes();
            if unreachable.is_empty() {
                println!("All nodes reachable.");
            } else {
                for node in unreachable {
                    println!("unreachable: {} ({})", node.id, node.title);
                }
            }
        }
    }
    Ok(())
}
