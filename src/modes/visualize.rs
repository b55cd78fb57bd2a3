//! Visualization mode for watching trained agents
//!
//! Loads a trained model and displays the agent playing held-out levels in a
//! TUI. Users can control playback speed, pause, and reset episodes.
//!
//! # Controls
//!
//! - Space: Pause/unpause
//! - R: Reset episode
//! - 1-4: Speed control (1=slow, 2=normal, 3=fast, 4=very fast)
//! - Q/Esc: Quit

use anyhow::{Context, Result};
use burn::module::AutodiffModule;
use burn::tensor::{Tensor, activation::softmax, backend::Backend};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{Stderr, stderr},
    path::Path,
    time::Duration,
};
use tokio::time::{Interval, interval};

use crate::render::{PlaybackInfo, Renderer};
use crate::rl::{ActorCriticNetwork, GridEnvironment, ModelMetadata, load_network};

/// Number of held-out level seeds used for playback
const PLAYBACK_LEVELS: u64 = 50;

/// Visualization speed settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizationSpeed {
    /// Slow: 2 Hz (500ms per step)
    Slow,
    /// Normal: 8 Hz (125ms per step)
    Normal,
    /// Fast: 20 Hz (50ms per step)
    Fast,
    /// Very Fast: 60 Hz (16ms per step)
    VeryFast,
}

impl VisualizationSpeed {
    fn tick_interval(&self) -> Duration {
        match self {
            Self::Slow => Duration::from_millis(500),
            Self::Normal => Duration::from_millis(125),
            Self::Fast => Duration::from_millis(50),
            Self::VeryFast => Duration::from_millis(16),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Slow => "Slow",
            Self::Normal => "Normal",
            Self::Fast => "Fast",
            Self::VeryFast => "Very Fast",
        }
    }
}

/// Visualization mode for watching trained agents
pub struct VisualizeMode<B: Backend> {
    /// Trained neural network (in inference mode)
    network: ActorCriticNetwork<B>,

    /// Environment over level seeds the agent never trained on
    env: GridEnvironment<B>,

    /// Renderer for TUI display
    renderer: Renderer,

    /// Whether to quit the visualization
    should_quit: bool,

    /// Whether playback is paused
    paused: bool,

    /// Current playback speed
    speed: VisualizationSpeed,

    /// Number of episodes completed
    episode_count: usize,
}

impl<B: Backend> VisualizeMode<B> {
    /// Create a new visualization mode
    ///
    /// Loads a trained model from the specified path. The environment is
    /// rebuilt from the saved metadata and plays held-out level seeds, so
    /// the playback shows generalization rather than memorized levels.
    pub fn new(model_path: &Path, device: B::Device) -> Result<Self> {
        use burn::backend::Autodiff;
        let (network, metadata) = load_network::<Autodiff<B>>(model_path, &device)
            .with_context(|| format!("Failed to load model from {:?}", model_path))?;

        // Convert to inference mode
        let network = network.valid();

        Self::print_model_info(model_path, &metadata);

        // Play back in the exact environment the agent trained in
        let env = GridEnvironment::new(
            metadata.game_config.clone(),
            metadata.levels.held_out(PLAYBACK_LEVELS),
            device,
        );

        Ok(Self {
            network,
            env,
            renderer: Renderer::new(),
            should_quit: false,
            paused: false,
            speed: VisualizationSpeed::Normal,
            episode_count: 0,
        })
    }

    fn print_model_info(model_path: &Path, metadata: &ModelMetadata) {
        println!("{}", "=".repeat(60));
        println!("Loaded Model Information");
        println!("{}", "=".repeat(60));
        println!("Model path: {:?}", model_path);
        println!("Updates completed: {}", metadata.updates);
        println!("Environment steps: {}", metadata.env_steps);
        println!(
            "Grid size: {}x{}",
            metadata.game_config.grid_width, metadata.game_config.grid_height
        );
        println!("Trained on: {}", metadata.levels);
        println!("Encoder: {:?}", metadata.ppo_config.encoder);
        println!("Version: {}", metadata.version);
        println!("{}", "=".repeat(60));
        println!();
        println!("Starting visualization...");
        println!();
    }

    /// Run the visualization loop
    ///
    /// Sets up the terminal, runs the main visualization loop, and cleans up
    /// on exit.
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        let result = self.run_visualization_loop(&mut terminal).await;

        self.cleanup_terminal(&mut terminal)?;

        result
    }

    /// Main visualization loop
    async fn run_visualization_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Game ticks based on speed
        let mut tick_timer = interval(self.speed.tick_interval());

        // Render at 30 FPS
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        let mut obs = self.env.reset();
        let mut done = false;

        loop {
            tokio::select! {
                // Handle keyboard input
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event, &mut tick_timer)?;
                    }
                }

                // Game logic tick
                _ = tick_timer.tick() => {
                    if !self.paused {
                        if done {
                            // Auto-restart on a fresh level
                            obs = self.env.reset();
                            done = false;
                            self.episode_count += 1;
                        } else {
                            obs = self.step_agent(obs);
                            done = self.env.state().terminated;
                        }
                    }
                }

                // Render frame
                _ = render_timer.tick() => {
                    terminal.draw(|frame| {
                        self.render_frame(frame);
                    }).context("Failed to draw frame")?;
                }

                // Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Step the agent forward one action
    ///
    /// Uses the trained network to select the highest-probability action and
    /// steps the environment.
    fn step_agent(&mut self, obs: Tensor<B, 3>) -> Tensor<B, 3> {
        let obs_batch = obs.unsqueeze_dim(0); // [1, 5, H, W]

        let (action_logits, _value) = self.network.forward(obs_batch);

        let action_probs = softmax(action_logits, 1);
        let action_idx = argmax_action(&action_probs);

        let (next_obs, _reward, _done) = self.env.step(action_idx);
        next_obs
    }

    /// Handle keyboard events
    fn handle_event(&mut self, event: Event, tick_timer: &mut Interval) -> Result<()> {
        if let Event::Key(key) = event {
            if key.kind != KeyEventKind::Press {
                return Ok(());
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Char(' ') => {
                    self.paused = !self.paused;
                }
                KeyCode::Char('r') => {
                    self.env.reset();
                    self.episode_count += 1;
                }
                KeyCode::Char('1') => {
                    self.change_speed(VisualizationSpeed::Slow, tick_timer);
                }
                KeyCode::Char('2') => {
                    self.change_speed(VisualizationSpeed::Normal, tick_timer);
                }
                KeyCode::Char('3') => {
                    self.change_speed(VisualizationSpeed::Fast, tick_timer);
                }
                KeyCode::Char('4') => {
                    self.change_speed(VisualizationSpeed::VeryFast, tick_timer);
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn change_speed(&mut self, new_speed: VisualizationSpeed, tick_timer: &mut Interval) {
        self.speed = new_speed;
        tick_timer.reset_after(self.speed.tick_interval());
    }

    /// Render the current frame
    fn render_frame(&self, frame: &mut ratatui::Frame) {
        let info = PlaybackInfo {
            episode: self.episode_count,
            speed: self.speed.as_str(),
            paused: self.paused,
        };
        self.renderer.render(frame, self.env.state(), &info);
    }

    /// Cleanup terminal state
    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

/// Select the action with highest probability (argmax)
fn argmax_action<B: Backend>(probs: &Tensor<B, 2>) -> usize {
    let probs_data = probs.to_data();
    let probs_vec: Vec<f32> = probs_data.to_vec().expect("Failed to convert probs to vec");

    probs_vec
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, LevelSet};
    use crate::rl::{
        ActorCriticConfig, EncoderKind, InferenceBackend, PPOAgent, PPOConfig, TrainingBackend,
        default_device, save_model,
    };
    use tempfile::TempDir;

    #[test]
    fn test_visualization_speed() {
        assert_eq!(
            VisualizationSpeed::Slow.tick_interval(),
            Duration::from_millis(500)
        );
        assert_eq!(
            VisualizationSpeed::Normal.tick_interval(),
            Duration::from_millis(125)
        );
        assert_eq!(
            VisualizationSpeed::Fast.tick_interval(),
            Duration::from_millis(50)
        );
        assert_eq!(
            VisualizationSpeed::VeryFast.tick_interval(),
            Duration::from_millis(16)
        );
    }

    #[test]
    fn test_argmax_action() {
        let device = default_device();
        let probs =
            Tensor::<InferenceBackend, 2>::from_floats([[0.1, 0.5, 0.2, 0.1, 0.1]], &device);

        let action = argmax_action(&probs);
        assert_eq!(action, 1);
    }

    #[test]
    fn test_visualize_mode_creation() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = temp_dir.path().join("test_model.mpk");

        // Create and save a test model
        let device = default_device();
        let config = PPOConfig {
            num_steps: 4,
            num_envs: 2,
            batch_size: 4,
            encoder: EncoderKind::Nature,
            ..Default::default()
        };
        let game_config = GameConfig::new(8);
        let network_config = ActorCriticConfig::new(8, 8, config.encoder);
        let network = network_config.init::<TrainingBackend>(&device);
        let agent = PPOAgent::new(network, config, device.clone());

        save_model(&agent, &game_config, LevelSet::new(0, 10), 0, &model_path).unwrap();

        // Load in visualize mode
        let visualize_mode = VisualizeMode::<InferenceBackend>::new(&model_path, device);

        assert!(visualize_mode.is_ok());
        let mode = visualize_mode.unwrap();
        assert_eq!(mode.episode_count, 0);
        assert!(!mode.paused);
        assert_eq!(mode.speed, VisualizationSpeed::Normal);
        // Playback must use held-out seeds, disjoint from the training range
        assert!(mode.env.state().level.seed >= 10);
        // The environment comes from the saved game config, not the default
        assert_eq!(mode.env.state().level.width, 8);
        assert_eq!(mode.env.state().level.height, 8);
    }
}
