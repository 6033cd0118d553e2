//! Correlation ids for outgoing envelopes.

/// Produces a correlation id for calls that arrive without one.
pub trait CorrelationSource: Send + Sync {
  fn next_id(&self) -> String;
}

/// `CID-` followed by two random base-36 fragments.
///
/// Not unique in any strong sense; collisions are possible but unlikely.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCorrelation;

impl CorrelationSource for RandomCorrelation {
  fn next_id(&self) -> String {
    format!(
      "CID-{}-{}",
      base36(rand::random::<u32>() as u64),
      base36(rand::random::<u32>() as u64)
    )
  }
}

/// Always returns the same id.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct FixedCorrelation(pub String);

#[cfg(test)]
impl CorrelationSource for FixedCorrelation {
  fn next_id(&self) -> String {
    self.0.clone()
  }
}

fn base36(mut n: u64) -> String {
  const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
  if n == 0 {
    return "0".to_string();
  }
  let mut out = Vec::new();
  while n > 0 {
    out.push(DIGITS[(n % 36) as usize]);
    n /= 36;
  }
  out.reverse();
  String::from_utf8_lossy(&out).into_owned()
}
