use serde::Serialize;
use time::Date;

use crate::users::repo::{UserFilter, UserRepository};

/// Head-counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: i64,
    pub active: i64,
    pub staff: i64,
    /// Joined on `today` (UTC calendar date).
    pub new_today: i64,
}

impl DashboardStats {
    pub async fn collect(users: &dyn UserRepository, today: Date) -> anyhow::Result<Self> {
        Ok(Self {
            total: users.count_where(&UserFilter::default()).await?,
            active: users.count_where(&UserFilter::active()).await?,
            staff: users.count_where(&UserFilter::staff()).await?,
            new_today: users.count_where(&UserFilter::joined_on(today)).await?,
        })
    }

    pub fn widgets(&self) -> Vec<KpiWidget> {
        vec![
            KpiWidget {
                title: "Total users".into(),
                metric: self.total,
                footer: format!("{} active • {} staff", self.active, self.staff),
                chart: "👥".into(),
            },
            KpiWidget {
                title: "New today".into(),
                metric: self.new_today,
                footer: "Joined in the last 24h".into(),
                chart: "📈".into(),
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiWidget {
    pub title: String,
    pub metric: i64,
    pub footer: String,
    pub chart: String,
}

/// Badge naming the deployment, shown at the top of the admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnvironmentBadge {
    pub label: &'static str,
    pub tone: &'static str,
}

impl EnvironmentBadge {
    pub fn for_environment(environment: &str) -> Self {
        let env = environment.to_lowercase();
        if env.contains("production") {
            Self { label: "Production", tone: "danger" }
        } else if env.contains("staging") {
            Self { label: "Staging", tone: "warning" }
        } else {
            Self { label: "Development", tone: "info" }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardContext {
    pub environment: EnvironmentBadge,
    pub stats: DashboardStats,
    pub kpi: Vec<KpiWidget>,
}

impl DashboardContext {
    pub fn new(environment: EnvironmentBadge, stats: DashboardStats) -> Self {
        Self {
            environment,
            stats,
            kpi: stats.widgets(),
        }
    }
}
