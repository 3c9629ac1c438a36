//! Goal context source. Reduces active goals to a one-line summary.

use crate::error::Result;
use crate::goals::GoalRepository;

/// Titles shown per domain before collapsing to a "+N more" suffix.
const TITLES_PER_DOMAIN: usize = 3;

/// Return a compact summary of active goals grouped by domain:
/// `"domainA: t1, t2, t3 (+N more); domainB: t1"`. Empty string when there
/// are no active goals.
pub async fn gather_goals(repo: &dyn GoalRepository) -> Result<String> {
    let goals = repo.list_active().await?;
    if goals.is_empty() {
        return Ok(String::new());
    }

    // Group by domain, preserving first-seen domain order.
    let mut order: Vec<String> = Vec::new();
    let mut by_domain: std::collections::HashMap<String, Vec<String>> =
        std::collections::HashMap::new();
    for goal in goals {
        if !by_domain.contains_key(&goal.domain) {
            order.push(goal.domain.clone());
        }
        by_domain.entry(goal.domain).or_default().push(goal.title);
    }

    let parts: Vec<String> = order
        .into_iter()
        .map(|domain| {
            let titles = &by_domain[&domain];
            let shown = titles
                .iter()
                .take(TITLES_PER_DOMAIN)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            let suffix = if titles.len() > TITLES_PER_DOMAIN {
                format!(" (+{} more)", titles.len() - TITLES_PER_DOMAIN)
            } else {
                String::new()
            };
            format!("{domain}: {shown}{suffix}")
        })
        .collect();

    Ok(parts.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::{Goal, GoalDashboard, GoalStatus, NoGoals};
    use async_trait::async_trait;

    struct FixedGoals(Vec<Goal>);

    #[async_trait]
    impl GoalRepository for FixedGoals {
        async fn list_active(&self) -> Result<Vec<Goal>> {
            Ok(self.0.clone())
        }

        async fn dashboard(&self) -> Result<GoalDashboard> {
            Ok(GoalDashboard::default())
        }
    }

    fn goal(title: &str, domain: &str) -> Goal {
        Goal {
            id: title.to_string(),
            title: title.to_string(),
            domain: domain.to_string(),
            status: GoalStatus::Active,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_empty_on_no_goals() {
        assert_eq!(gather_goals(&NoGoals).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_groups_by_domain_with_overflow() {
        let repo = FixedGoals(vec![
            goal("ship v1", "productivity"),
            goal("write docs", "productivity"),
            goal("fix CI", "productivity"),
            goal("refactor", "productivity"),
            goal("run 5k", "health"),
        ]);
        let summary = gather_goals(&repo).await.unwrap();
        assert_eq!(
            summary,
            "productivity: ship v1, write docs, fix CI (+1 more); health: run 5k"
        );
    }
}
