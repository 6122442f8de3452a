pub mod augmentation;
pub mod dataloader;
pub mod image_decoder;
pub mod preprocessing;
pub mod rand_augment;
pub mod sample_list;
pub mod sampler;
pub mod sim_augment;
