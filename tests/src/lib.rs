//! End-to-end scenarios: frames in, records out.

#[cfg(test)]
mod support;

#[cfg(test)]
mod end_to_end;
