pub mod link_speed;
