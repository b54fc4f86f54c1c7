//! Per-agent views into the joint observation and action vectors
//!
//! Several agents may share one environment. The environment sees the
//! concatenation of their observations and actions; agent `ag` owns the
//! contiguous block `[ag * dim, (ag + 1) * dim)` of each.

use ndarray::{s, ArrayViewMut1};

use rlkit_core::{BoxSpace, ContinuousAction, RLError, Result, VectorObservation};

/// Block layout of agents inside joint vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentLayout {
    /// Number of agents
    pub agent_num: usize,
    /// Observation width per agent
    pub observe_dim: usize,
    /// Action width per agent
    pub action_dim: usize,
}

impl AgentLayout {
    /// Create a layout
    #[must_use]
    pub fn new(agent_num: usize, observe_dim: usize, action_dim: usize) -> Self {
        Self {
            agent_num,
            observe_dim,
            action_dim,
        }
    }

    /// Width of the joint observation
    #[must_use]
    pub fn joint_observe_dim(&self) -> usize {
        self.agent_num * self.observe_dim
    }

    /// Width of the joint action
    #[must_use]
    pub fn joint_action_dim(&self) -> usize {
        self.agent_num * self.action_dim
    }

    /// Check that an environment's spaces have exactly the joint widths
    pub fn validate(&self, observation_space: &BoxSpace, action_space: &BoxSpace) -> Result<()> {
        RLError::check_dim(self.joint_observe_dim(), observation_space.dim())?;
        RLError::check_dim(self.joint_action_dim(), action_space.dim())
    }

    /// Agent `ag`'s slice of a joint observation
    pub fn observation(&self, joint: &VectorObservation, ag: usize) -> Result<VectorObservation> {
        self.check_agent(ag)?;
        RLError::check_dim(self.joint_observe_dim(), joint.dim())?;
        joint.slice(ag * self.observe_dim, self.observe_dim)
    }

    /// Agent `ag`'s slice of a joint action, copied out
    pub fn action(&self, joint: &ContinuousAction, ag: usize) -> Result<ContinuousAction> {
        self.check_agent(ag)?;
        RLError::check_dim(self.joint_action_dim(), joint.dim())?;
        let begin = ag * self.action_dim;
        Ok(ContinuousAction(joint.0.slice(s![begin..begin + self.action_dim]).to_owned()))
    }

    /// Mutable view of agent `ag`'s slice of a joint action
    pub fn action_mut<'a>(&self, joint: &'a mut ContinuousAction, ag: usize) -> Result<ArrayViewMut1<'a, f32>> {
        self.check_agent(ag)?;
        RLError::check_dim(self.joint_action_dim(), joint.dim())?;
        let begin = ag * self.action_dim;
        Ok(joint.0.slice_mut(s![begin..begin + self.action_dim]))
    }

    fn check_agent(&self, ag: usize) -> Result<()> {
        if ag < self.agent_num {
            Ok(())
        } else {
            Err(RLError::Agent(format!(
                "agent index {ag} out of range for {} agents",
                self.agent_num
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_agents() -> AgentLayout {
        AgentLayout::new(2, 3, 2)
    }

    #[test]
    fn test_observation_blocks() {
        let layout = two_agents();
        let joint = VectorObservation::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(layout.observation(&joint, 0).unwrap().data.to_vec(), vec![0.0, 1.0, 2.0]);
        assert_eq!(layout.observation(&joint, 1).unwrap().data.to_vec(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_action_write_then_read() {
        let layout = two_agents();
        let mut joint = ContinuousAction::zeros(layout.joint_action_dim());
        layout
            .action_mut(&mut joint, 1)
            .unwrap()
            .assign(&ndarray::arr1(&[0.5, -0.5]));

        assert_eq!(joint.to_vec(), vec![0.0, 0.0, 0.5, -0.5]);
        assert_eq!(layout.action(&joint, 1).unwrap().to_vec(), vec![0.5, -0.5]);
    }

    #[test]
    fn test_mismatched_widths_are_errors() {
        let layout = two_agents();
        let short = VectorObservation::new(vec![0.0; 5]);
        assert!(matches!(
            layout.observation(&short, 1),
            Err(RLError::DimensionMismatch { expected: 6, actual: 5 })
        ));
        assert!(matches!(
            layout.validate(&BoxSpace::uniform(6, -1.0, 1.0), &BoxSpace::uniform(3, -1.0, 1.0)),
            Err(RLError::DimensionMismatch { expected: 4, actual: 3 })
        ));
        layout
            .validate(&BoxSpace::uniform(6, -1.0, 1.0), &BoxSpace::uniform(4, -1.0, 1.0))
            .unwrap();
    }

    #[test]
    fn test_agent_index_out_of_range() {
        let layout = two_agents();
        let joint = ContinuousAction::zeros(4);
        assert!(matches!(layout.action(&joint, 2), Err(RLError::Agent(_))));
    }
}
