use anyhow::Result;
use clap::{Parser, ValueEnum};
use gridrun::game::{GameConfig, LevelSet};
use gridrun::modes::{EvaluateConfig, EvaluateMode, TrainConfig, TrainMode, VisualizeMode};
use gridrun::rl::{Augmentation, EncoderKind, InferenceBackend, PPOConfig, default_device};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gridrun")]
#[command(version, about = "Procedural grid navigation with PPO training")]
struct Cli {
    /// Execution mode
    #[arg(long, default_value = "train")]
    mode: Mode,

    /// Path for saving (train) or loading (evaluate, visualize) the model
    #[arg(long, default_value = "models/gridrun.mpk")]
    model_path: PathBuf,

    /// Grid size (square)
    #[arg(long, default_value = "16")]
    grid_size: usize,

    /// First level seed of the training set
    #[arg(long, default_value = "0")]
    start_level: u64,

    /// Number of training levels (0 = unlimited)
    #[arg(long, default_value = "200")]
    num_levels: u64,

    /// Total environment steps to train for
    #[arg(long, default_value = "25000000")]
    total_steps: usize,

    /// Encoder architecture
    #[arg(long, default_value = "impala")]
    encoder: EncoderKind,

    /// Observation augmentation during rollouts
    #[arg(long, default_value = "rand-conv")]
    augmentation: Augmentation,

    /// Number of episodes in evaluate mode
    #[arg(long, default_value = "100")]
    episodes: usize,

    /// Number of held-out levels for evaluation
    #[arg(long, default_value = "50")]
    eval_levels: u64,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    /// Train a PPO agent
    Train,
    /// Score a trained agent on held-out levels
    Evaluate,
    /// Watch a trained agent play in the terminal
    Visualize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let device = default_device();

    match cli.mode {
        Mode::Train => {
            let config = TrainConfig {
                total_steps: cli.total_steps,
                save_path: cli.model_path,
                levels: LevelSet::new(cli.start_level, cli.num_levels),
                eval_levels: cli.eval_levels,
                game_config: GameConfig::new(cli.grid_size),
                ppo_config: PPOConfig {
                    encoder: cli.encoder,
                    augmentation: cli.augmentation,
                    ..PPOConfig::default()
                },
                ..TrainConfig::default()
            };
            let mut train_mode = TrainMode::<gridrun::rl::TrainingBackend>::new(config, device)?;
            train_mode.run()?;
        }
        Mode::Evaluate => {
            let config = EvaluateConfig {
                model_path: cli.model_path,
                episodes: cli.episodes,
                eval_levels: cli.eval_levels,
            };
            let mut evaluate_mode = EvaluateMode::<InferenceBackend>::new(config, device)?;
            evaluate_mode.run()?;
        }
        Mode::Visualize => {
            let mut visualize_mode =
                VisualizeMode::<InferenceBackend>::new(&cli.model_path, device)?;
            visualize_mode.run().await?;
        }
    }

    Ok(())
}
