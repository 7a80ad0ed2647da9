use crate::ai::FeedbackRequest;

/// Two-sentence feedback built from the score band and the weakest bucket.
pub fn local_feedback(req: &FeedbackRequest) -> String {
    let opening = match req.score {
        90.. => format!("Excellent work on {}, you clearly understand the material.", req.subtopic_title),
        70..=89 => format!("Good job on {}, you have a solid grasp of the key ideas.", req.subtopic_title),
        50..=69 => format!("You are getting there with {}, several ideas have already clicked.", req.subtopic_title),
        _ => format!("{} is still new to you, and that is fine at this stage.", req.subtopic_title),
    };

    let next_step = match req.buckets.weakest() {
        _ if req.missed.is_empty() => String::from("Move on to the next subtopic while it is fresh."),
        Some("foundation") => String::from("Re-read the core definitions before trying the checkpoint again."),
        Some("application") => String::from("Work through the examples again and try applying each step yourself."),
        Some(_) => String::from("Try connecting this subtopic with earlier material to strengthen the harder questions."),
        None => String::from("Review the content and try the checkpoint again."),
    };

    format!("{opening} {next_step}")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::BucketScores;
    use crate::engine::scoring::BucketScore;

    fn request(score: u32, buckets: BucketScores, missed: usize) -> FeedbackRequest {
        FeedbackRequest {
            subtopic_title: "Limits".into(),
            score,
            passed: score >= 70,
            buckets,
            missed: vec!["q".into(); missed],
        }
    }

    fn bucket(correct: u32, total: u32) -> BucketScore {
        BucketScore {
            correct,
            total,
            percent: 100.0 * correct as f64 / total as f64,
        }
    }

    #[test]
    fn perfect_score() {
        let buckets = BucketScores {
            foundation: bucket(2, 2),
            application: bucket(2, 2),
            synthesis: bucket(1, 1),
        };
        let text = local_feedback(&request(100, buckets, 0));
        assert!(text.starts_with("Excellent work on Limits"));
        assert!(text.ends_with("Move on to the next subtopic while it is fresh."));
    }

    #[test]
    fn points_at_weakest_bucket() {
        let buckets = BucketScores {
            foundation: bucket(2, 2),
            application: bucket(0, 2),
            synthesis: bucket(1, 1),
        };
        let text = local_feedback(&request(65, buckets, 2));
        assert!(text.contains("getting there"));
        assert!(text.contains("examples again"));
        assert_eq!(text.matches('.').count(), 2);
    }
}
