pub mod delivery_manager;
