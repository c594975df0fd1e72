pub mod mardel;
