use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical axis a statistics query can be filtered on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Queue,
    User,
    Vo,
    Status,
    EndpointType,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Queue,
        Dimension::User,
        Dimension::Vo,
        Dimension::Status,
        Dimension::EndpointType,
    ];

    /// Normalization table holding the names of this dimension.
    pub fn table(self) -> &'static str {
        match self {
            Dimension::Queue => "Queues",
            Dimension::User => "Users",
            Dimension::Vo => "WLCGVOs",
            Dimension::Status => "Status",
            Dimension::EndpointType => "Endpoints",
        }
    }

    /// Id column of the `AAR` fact table referencing the normalization table.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Queue => "QueueID",
            Dimension::User => "UserID",
            Dimension::Vo => "VOID",
            Dimension::Status => "StatusID",
            Dimension::EndpointType => "EndpointID",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Queue => "queue",
            Dimension::User => "user",
            Dimension::Vo => "WLCG VO",
            Dimension::Status => "status",
            Dimension::EndpointType => "endpoint type",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub interface: String,
    pub url: String,
}

impl Endpoint {
    /// Composite name used to look endpoints up: `<interface>:<url>`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.interface, self.url)
    }
}

/// Aggregated counters over the records matching a predicate.
///
/// Sums and range bounds are `None` when no record matched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResult {
    pub count: i64,
    pub walltime: Option<i64>,
    pub cpu_user_time: Option<i64>,
    pub cpu_kernel_time: Option<i64>,
    pub stage_in: Option<i64>,
    pub stage_out: Option<i64>,
    pub range_start: Option<i64>,
    pub range_end: Option<i64>,
}

impl StatsResult {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
