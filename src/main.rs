//! Windjammer headless demo
//!
//! Runs a sample block program against the simulation at a synthetic
//! 60 fps frame clock, then submits the final score through the
//! persistence fallback chain. Useful for exercising the whole core
//! without a renderer attached.

use windjammer::consts::MS_PER_TICK;
use windjammer::persistence::{FallbackStore, JsonFileStore, MemoryStore, ScoreStore, StoredRank};
use windjammer::program::{ActionKind, Condition, Node, Program};
use windjammer::sim::{ObstacleKind, Run};
use windjammer::Settings;

/// A reasonable sailor: cannon boats, jump everything else that gets
/// close, and drop the sails when a storm rolls in.
fn demo_program() -> Program {
    let program = Program::new(vec![Node::Forever {
        body: vec![
            Node::If {
                condition: Condition::StormActive,
                then_body: vec![Node::Action {
                    kind: ActionKind::SailDown,
                }],
                else_body: Some(vec![Node::Action {
                    kind: ActionKind::SailUp,
                }]),
            },
            Node::If {
                condition: Condition::ObstacleTypeEquals {
                    value: ObstacleKind::Boat,
                },
                then_body: vec![Node::Action {
                    kind: ActionKind::Cannon,
                }],
                else_body: None,
            },
            Node::If {
                condition: Condition::DistanceLessThan { value: 120.0 },
                then_body: vec![Node::If {
                    condition: Condition::ObstacleTypeEquals {
                        value: ObstacleKind::Shark,
                    },
                    then_body: vec![],
                    else_body: Some(vec![Node::Action {
                        kind: ActionKind::Jump,
                    }]),
                }],
                else_body: None,
            },
        ],
    }]);
    match program {
        Ok(program) => program,
        Err(err) => {
            // The demo program is static; a validation failure here is a
            // bug in this file.
            log::error!("demo program failed validation: {err}");
            std::process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();

    let settings = Settings::load_from(std::path::Path::new("windjammer_settings.json"));
    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xC0FFEE);

    log::info!(
        "windjammer headless demo (seed {seed}, speed {}x)",
        settings.speed
    );

    let mut run = Run::new(demo_program(), seed, 0.0);

    // Synthetic 60 fps frame clock; the run ends on collision or after
    // five virtual minutes of survival.
    let frame_ms = 1000.0 / 60.0;
    let max_frames = (5 * 60 * 1000) as f64 / frame_ms;
    let mut now_ms = 0.0;
    let mut frames = 0u64;

    while run.is_running() {
        now_ms += frame_ms;
        frames += 1;
        let report = run.advance_frame(now_ms, settings.speed);
        if report.score_changed && report.score % 250 == 0 {
            log::info!("score {} at tick {}", report.score, run.state().tick);
        }
        if frames as f64 >= max_frames {
            run.force_stop();
        }
    }

    let score = run.score();
    let reason = run
        .end_reason()
        .map(|r| r.message())
        .unwrap_or("run never ended");
    println!(
        "run over after {} ticks ({:.1}s simulated): {reason}",
        run.state().tick,
        run.state().tick as f64 * MS_PER_TICK / 1000.0
    );
    println!("final score: {score}");

    // Submit through the fallback chain: file store first, memory store if
    // the disk is not cooperating. Failure to persist is never fatal.
    let mut store = FallbackStore::new(
        JsonFileStore::new("windjammer_scores.json"),
        MemoryStore::new(),
    );
    match store.save("demo", score) {
        Ok(StoredRank::Ranked(rank)) => println!("leaderboard rank: #{rank}"),
        Ok(StoredRank::Unranked) => println!("score did not make the leaderboard"),
        Err(err) => log::warn!("score could not be stored anywhere: {err}"),
    }

    if let Ok(top) = store.top(3) {
        for (i, entry) in top.iter().enumerate() {
            println!("  #{} {} - {}", i + 1, entry.name, entry.score);
        }
    }
}
