#![forbid(unsafe_code)]



#[cfg(test)]
mod frames;
#[cfg(test)]
mod render_thread;
#[cfg(test)]
mod session;
