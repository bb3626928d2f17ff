mod label;
mod paint;
mod view;
