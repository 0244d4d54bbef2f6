#![doc = include_str!("../README.md")]
#![no_std]
#![deny(unsafe_code)]

mod blob;
mod container;
mod error;
mod handle;
#[allow(unsafe_code)]
mod queue;
mod stack;

pub use allocator_api2::alloc::{AllocError, Allocator, Global};

pub use self::{
    blob::Blob,
    container::Container,
    error::Error,
    handle::Handle,
    queue::{ByteQueue, Queue},
    stack::{ByteStack, Stack},
};
