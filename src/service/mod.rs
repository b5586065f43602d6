//! 服务层：路线服务抽象与实现（HTTP / Mock）

pub mod http;
pub mod mock;
pub mod traits;

pub use http::HttpTourService;
pub use mock::{demo_stages, CallCounts, MockTourService};
pub use traits::{PlanRequest, ServiceError, TourService};
