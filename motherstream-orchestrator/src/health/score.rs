//! Health score computation: starts at 100, subtracts per rule. See
//! `spec.md` §8 P9/P10 for the invariants this must satisfy.

use super::sampler::PipelineState;

#[derive(Debug, Clone)]
pub struct ScoreInput {
    pub pipeline_state: PipelineState,
    pub visibility_problematic: bool,
    pub fps_variance_exceeded: bool,
    pub fps_dropped: bool,
    pub playback_stalled: bool,
    pub timestamp_jumped: bool,
    pub frame_drop_rate: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ScoreResult {
    pub score: u8,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn compute(input: &ScoreInput) -> ScoreResult {
    let mut score: i32 = 100;
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    if input.visibility_problematic {
        score -= 60;
        issues.push("CRITICAL_VISIBLE_NOT_PLAYING".to_string());
    }
    if input.playback_stalled {
        score -= 60;
        issues.push("CRITICAL_PLAYBACK_STALLED".to_string());
    }

    match input.pipeline_state {
        PipelineState::Stopped | PipelineState::Error => {
            score -= 50;
            issues.push("CRITICAL_NOT_PLAYING".to_string());
        }
        PipelineState::Buffering | PipelineState::Paused | PipelineState::Unknown => {
            score -= 15;
            warnings.push("PIPELINE_NOT_PLAYING".to_string());
        }
        PipelineState::Playing => {}
    }

    if input.fps_variance_exceeded {
        score -= 10;
        warnings.push("FPS_VARIANCE".to_string());
    }
    if input.fps_dropped {
        score -= 10;
        warnings.push("FPS_DROP".to_string());
    }
    if input.timestamp_jumped {
        score -= 15;
        warnings.push("TIMESTAMP_JUMP".to_string());
    }

    if input.frame_drop_rate > 5.0 {
        score -= 50;
        issues.push("CRITICAL_FRAME_DROP_RATE".to_string());
    } else if input.frame_drop_rate > 1.0 {
        score -= 10;
        warnings.push("FRAME_DROP_RATE".to_string());
    }

    ScoreResult { score: score.clamp(0, 100) as u8, issues, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> ScoreInput {
        ScoreInput {
            pipeline_state: PipelineState::Playing,
            visibility_problematic: false,
            fps_variance_exceeded: false,
            fps_dropped: false,
            playback_stalled: false,
            timestamp_jumped: false,
            frame_drop_rate: 0.0,
        }
    }

    #[test]
    fn fully_healthy_scores_one_hundred() {
        let result = compute(&healthy());
        assert_eq!(result.score, 100);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn score_never_exceeds_bounds() {
        let mut input = healthy();
        input.visibility_problematic = true;
        input.playback_stalled = true;
        input.pipeline_state = PipelineState::Error;
        input.frame_drop_rate = 20.0;
        let result = compute(&input);
        assert!(result.score <= 100);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn any_critical_issue_caps_score_at_fifty() {
        let cases: Vec<ScoreInput> = vec![
            ScoreInput { visibility_problematic: true, ..healthy() },
            ScoreInput { playback_stalled: true, ..healthy() },
            ScoreInput { pipeline_state: PipelineState::Stopped, ..healthy() },
            ScoreInput { pipeline_state: PipelineState::Error, ..healthy() },
            ScoreInput { frame_drop_rate: 20.0, ..healthy() },
        ];
        for input in cases {
            let result = compute(&input);
            assert!(result.issues.iter().any(|i| i.starts_with("CRITICAL_")));
            assert!(
                result.score <= 50,
                "expected score <= 50 for {:?}, got {}",
                input,
                result.score
            );
        }
    }
}
