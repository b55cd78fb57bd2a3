use burn::tensor::{Tensor, TensorData, backend::Backend};

use crate::game::GameState;

/// Number of channels in the observation tensor
pub const NUM_OBS_CHANNELS: usize = 5;

/// Create a 5-channel observation tensor from game state
///
/// Channels:
/// - 0: Agent position (1.0 at agent cell)
/// - 1: Remaining coins (1.0 at each uncollected coin)
/// - 2: Walls (1.0 at wall cells, border included)
/// - 3: Hazards (1.0 at hazard cells)
/// - 4: Goal (1.0 at goal cell)
///
/// Returns: Tensor<B, 3> with shape [5, height, width]
pub fn create_observation<B: Backend>(state: &GameState, device: &B::Device) -> Tensor<B, 3> {
    let agent_channel = create_agent_channel(state, device);
    let coins_channel = create_coins_channel(state, device);
    let walls_channel = create_walls_channel(state, device);
    let hazards_channel = create_hazards_channel(state, device);
    let goal_channel = create_goal_channel(state, device);

    // Stack channels along dimension 0: [5, height, width]
    // Each channel is [height, width], stacking creates [5, height, width]
    Tensor::stack(
        vec![
            agent_channel,
            coins_channel,
            walls_channel,
            hazards_channel,
            goal_channel,
        ],
        0,
    )
}

fn blank(state: &GameState) -> Vec<f32> {
    vec![0.0; state.level.height * state.level.width]
}

fn to_tensor<B: Backend>(data: Vec<f32>, state: &GameState, device: &B::Device) -> Tensor<B, 2> {
    let tensor_data = TensorData::new(data, [state.level.height, state.level.width]);
    Tensor::<B, 2>::from_data(tensor_data, device)
}

/// Channel with the agent position (1.0 at agent cell, 0.0 elsewhere)
fn create_agent_channel<B: Backend>(state: &GameState, device: &B::Device) -> Tensor<B, 2> {
    let mut data = blank(state);
    let idx = (state.agent.y as usize) * state.level.width + (state.agent.x as usize);
    data[idx] = 1.0;
    to_tensor(data, state, device)
}

/// Channel with remaining coins (1.0 at each uncollected coin)
fn create_coins_channel<B: Backend>(state: &GameState, device: &B::Device) -> Tensor<B, 2> {
    let mut data = blank(state);
    for &coin in &state.coins {
        let idx = (coin.y as usize) * state.level.width + (coin.x as usize);
        data[idx] = 1.0;
    }
    to_tensor(data, state, device)
}

/// Channel with wall cells (border included)
fn create_walls_channel<B: Backend>(state: &GameState, device: &B::Device) -> Tensor<B, 2> {
    let mut data = blank(state);
    for wall in state.level.wall_positions() {
        let idx = (wall.y as usize) * state.level.width + (wall.x as usize);
        data[idx] = 1.0;
    }
    to_tensor(data, state, device)
}

/// Channel with hazard cells
fn create_hazards_channel<B: Backend>(state: &GameState, device: &B::Device) -> Tensor<B, 2> {
    let mut data = blank(state);
    for hazard in state.level.hazard_positions() {
        let idx = (hazard.y as usize) * state.level.width + (hazard.x as usize);
        data[idx] = 1.0;
    }
    to_tensor(data, state, device)
}

/// Channel with the goal cell
fn create_goal_channel<B: Backend>(state: &GameState, device: &B::Device) -> Tensor<B, 2> {
    let mut data = blank(state);
    let goal = state.level.goal;
    let idx = (goal.y as usize) * state.level.width + (goal.x as usize);
    data[idx] = 1.0;
    to_tensor(data, state, device)
}
