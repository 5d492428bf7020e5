pub mod subscription_lifecycle;
pub mod subscription_plan;
