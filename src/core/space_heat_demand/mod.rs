pub mod heat_loss;
