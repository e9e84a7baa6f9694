pub mod billing_controller;
