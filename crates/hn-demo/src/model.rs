//! Number partitioning: split a multiset of integers into two sets whose sums
//! are as close as possible.

use std::fs;
use std::path::Path;

use hn_engine::{Instance, InstanceLoader, Solution, SolutionValidator, ValidationResult};
use hn_types::{HnError, HnResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionInstance {
    id: String,
    numbers: Vec<u64>,
}

impl PartitionInstance {
    pub fn new(id: impl Into<String>, numbers: Vec<u64>) -> Self {
        Self {
            id: id.into(),
            numbers,
        }
    }

    /// Parse whitespace separated non-negative integers. Lines starting
    /// with `#` are comments.
    pub fn parse(id: impl Into<String>, text: &str) -> HnResult<Self> {
        let id = id.into();
        let numbers = text
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .flat_map(str::split_whitespace)
            .map(|token| {
                token.parse::<u64>().map_err(|e| {
                    HnError::Internal(format!("instance {id}: invalid number {token:?}: {e}"))
                })
            })
            .collect::<HnResult<Vec<_>>>()?;
        if numbers.is_empty() {
            return Err(HnError::Internal(format!("instance {id} has no numbers")));
        }
        Ok(Self { id, numbers })
    }

    pub fn numbers(&self) -> &[u64] {
        &self.numbers
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.numbers.iter().sum()
    }
}

impl Instance for PartitionInstance {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Side assignment per number; `true` puts it in the first set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    sides: Vec<bool>,
    /// Sum of the first set minus sum of the second set.
    balance: i128,
}

impl Partition {
    pub fn from_sides(instance: &PartitionInstance, sides: Vec<bool>) -> Self {
        let balance = signed_balance(instance.numbers(), &sides);
        Self { sides, balance }
    }

    pub fn sides(&self) -> &[bool] {
        &self.sides
    }

    pub fn balance(&self) -> i128 {
        self.balance
    }

    pub fn difference(&self) -> u128 {
        self.balance.unsigned_abs()
    }

    /// Balance after moving number `index` to the other set.
    pub fn balance_after_flip(&self, instance: &PartitionInstance, index: usize) -> i128 {
        let delta = 2 * instance.numbers()[index] as i128;
        if self.sides[index] {
            self.balance - delta
        } else {
            self.balance + delta
        }
    }

    pub fn flip(&mut self, instance: &PartitionInstance, index: usize) {
        self.balance = self.balance_after_flip(instance, index);
        self.sides[index] = !self.sides[index];
    }
}

impl Solution for Partition {
    fn objective(&self) -> f64 {
        self.difference() as f64
    }
}

fn signed_balance(numbers: &[u64], sides: &[bool]) -> i128 {
    numbers
        .iter()
        .zip(sides)
        .map(|(&n, &first)| if first { n as i128 } else { -(n as i128) })
        .sum()
}

/// Reads instance files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionLoader;

impl InstanceLoader<PartitionInstance> for PartitionLoader {
    fn load(&self, path: &str) -> HnResult<PartitionInstance> {
        let text = fs::read_to_string(path)?;
        let id = Path::new(path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(path);
        PartitionInstance::parse(id, &text)
    }
}

/// Checks that every number is assigned and the cached balance is right.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionValidator;

impl SolutionValidator<PartitionInstance, Partition> for PartitionValidator {
    fn validate(&self, instance: &PartitionInstance, solution: &Partition) -> ValidationResult {
        let complete = solution.sides().len() == instance.len();
        let result = ValidationResult::ok().check(
            complete,
            format!(
                "{} numbers assigned, instance has {}",
                solution.sides().len(),
                instance.len()
            ),
        );
        if !complete {
            return result;
        }
        let actual = signed_balance(instance.numbers(), solution.sides());
        result.check(
            actual == solution.balance(),
            format!("cached balance {} but actual {}", solution.balance(), actual),
        )
    }
}
