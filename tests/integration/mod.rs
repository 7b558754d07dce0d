mod stock_manager_workflow;
mod valuation_workflow;
mod yahoo_client;
