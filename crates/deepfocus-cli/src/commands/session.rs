use chrono::{DateTime, Duration, Utc};
use clap::{Subcommand, ValueEnum};
use deepfocus_core::calibration::GameKind;
use deepfocus_core::controller::ProgressionController;
use deepfocus_core::playback::apply_intents;
use deepfocus_core::quiz::FallbackQuizSource;
use deepfocus_core::storage::ProgressDb;
use deepfocus_core::{AttemptPhase, Event, PlaybackSurface, SimulatedPlayer, SkillGraph};

#[derive(Clone, Copy, ValueEnum)]
pub enum Game {
    Nback,
    Reaction,
}

impl From<Game> for GameKind {
    fn from(game: Game) -> Self {
        match game {
            Game::Nback => GameKind::NBack,
            Game::Reaction => GameKind::Reaction,
        }
    }
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Simulate a complete attempt on a virtual clock and print the
    /// event stream
    Run {
        /// Node id from the skill tree
        node_id: String,
        /// Calibration mini-game played by the simulated user
        #[arg(long, value_enum, default_value = "reaction")]
        game: Game,
        /// Seed for the calibration RNG, for replayable sessions
        #[arg(long)]
        seed: Option<u64>,
        /// Answer the first quiz wrong to show the rewind penalty
        #[arg(long)]
        flub: bool,
    },
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Run {
            node_id,
            game,
            seed,
            flub,
        } => run_session(&node_id, game.into(), seed, flub),
    }
}

fn emit(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

fn run_session(
    node_id: &str,
    kind: GameKind,
    seed: Option<u64>,
    flub: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = ProgressDb::open()?;
    let mut ctl = ProgressionController::new(
        SkillGraph::default_catalog(),
        db,
        Box::new(FallbackQuizSource),
    )?;
    if let Some(seed) = seed {
        ctl = ctl.with_calibration_seed(seed);
    }

    let mut now = Utc::now();
    let event = ctl
        .select_node(node_id, now)
        .ok_or_else(|| format!("node {node_id} is unknown or still locked"))?;
    emit(&event)?;
    let duration_secs = ctl.node().map(|n| n.duration_secs).unwrap_or(0);

    // ── Calibration ──────────────────────────────────────────────────
    ctl.enter_calibration();
    if let Some(event) = ctl.choose_protocol(kind, now) {
        emit(&event)?;
    }

    // The simulated user plays perfectly: reaction responses land 150ms
    // after the signal, and N-Back flags fire only on true 2-back
    // matches. N-Back still usually fails with a uniform random
    // sequence; that is the nature of the game, not a bug here.
    let mut respond_at: Option<DateTime<Utc>> = None;
    let mut flagged_through = 0usize;
    while ctl.phase() == AttemptPhase::Calibrating {
        now += Duration::milliseconds(100);
        for event in ctl.tick_calibration(now) {
            if matches!(event, Event::ReactionArmed { .. }) {
                respond_at = Some(now + Duration::milliseconds(150));
            }
            emit(&event)?;
        }
        if respond_at.map(|due| now >= due).unwrap_or(false) {
            ctl.respond(now);
            respond_at = None;
        }
        if let Some(session) = ctl.calibration().and_then(|e| e.nback()) {
            let seq = session.sequence();
            let len = seq.len();
            if len > flagged_through {
                if len >= 3 && seq[len - 1] == seq[len - 3] {
                    ctl.flag_match();
                }
                flagged_through = len;
            }
        }
    }

    if ctl.phase() != AttemptPhase::Playing {
        println!("Calibration failed; the node stays gated. Run again to retry.");
        return Ok(());
    }

    // ── Playback ─────────────────────────────────────────────────────
    let mut player = SimulatedPlayer::new(f64::from(duration_secs));
    player.play();
    let poll_step = Duration::milliseconds(ctl.poll_interval_ms() as i64);
    let advance_secs = ctl.poll_interval_ms() as f64 / 1000.0;
    let mut flubbed = !flub;

    while !player.has_ended() {
        now += poll_step;
        player.advance(advance_secs);
        if let Some(prompt) = ctl.poll_playback(player.current_time(), now) {
            apply_intents(&mut player, &prompt.intents);
            emit(&prompt.event)?;
            let question = &prompt.question;
            println!("  Q: {}", question.prompt);
            for (i, option) in question.options.iter().enumerate() {
                println!("     {i}. {option}");
            }
            let chosen = if flubbed {
                question.correct_index
            } else {
                flubbed = true;
                (question.correct_index + 1) % question.options.len()
            };
            if let Some(resolution) = ctl.submit_answer(chosen, now) {
                apply_intents(&mut player, &resolution.outcome.intents);
                for event in &resolution.events {
                    emit(event)?;
                }
                if !resolution.outcome.explanation.is_empty() {
                    println!("  note: {}", resolution.outcome.explanation);
                }
            }
        }
    }

    if let Some(event) = ctl.handle_ended(now)? {
        emit(&event)?;
    }
    println!(
        "Total EXP: {}  Completed nodes: {}",
        ctl.progress().current_exp,
        ctl.progress().completed_ids.len()
    );
    Ok(())
}
