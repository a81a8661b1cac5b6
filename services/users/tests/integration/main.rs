mod account_test;
mod resources_test;
mod router_test;
mod user_test;
