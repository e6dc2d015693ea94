pub mod operation_executor;
pub mod provisioning;
pub mod reconciliation;
pub mod registry;
pub mod savings_planner;
pub mod selection;
pub mod snapshot_collector;
pub mod transfer_planner;

#[cfg(test)]
pub mod mock_gateway;
