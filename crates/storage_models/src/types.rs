use diesel::{
    backend::Backend,
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    serialize::{self, Output, ToSql},
    sql_types,
};

/// Amount in the minor denomination of its currency (cents for USD). All
/// core arithmetic happens in this unit; conversion to a major denomination
/// is a presentation concern and does not exist in this crate.
#[derive(
    Default,
    Debug,
    serde::Deserialize,
    serde::Serialize,
    AsExpression,
    FromSqlRow,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
)]
#[diesel(sql_type = sql_types::BigInt)]
#[serde(transparent)]
pub struct MinorUnit(i64);

impl MinorUnit {
    /// Forms a new minor unit from an amount in minor denomination
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Forms a new minor default unit i.e zero
    pub fn zero() -> Self {
        Self(0)
    }

    /// Gets the amount as a raw i64 value
    pub fn get_amount_as_i64(self) -> i64 {
        self.0
    }

    /// True for amounts strictly below zero
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Saturating difference, floored at zero
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0).max(0))
    }
}

impl std::fmt::Display for MinorUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for MinorUnit {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Sub for MinorUnit {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for MinorUnit {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl<DB> FromSql<sql_types::BigInt, DB> for MinorUnit
where
    DB: Backend,
    i64: FromSql<sql_types::BigInt, DB>,
{
    fn from_sql(value: DB::RawValue<'_>) -> deserialize::Result<Self> {
        let val = i64::from_sql(value)?;
        Ok(Self(val))
    }
}

impl<DB> ToSql<sql_types::BigInt, DB> for MinorUnit
where
    DB: Backend,
    i64: ToSql<sql_types::BigInt, DB>,
{
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, DB>) -> serialize::Result {
        self.0.to_sql(out)
    }
}

#[cfg(test)]
mod minor_unit_tests {
    use super::MinorUnit;

    #[test]
    fn arithmetic() {
        let amount = MinorUnit::new(1000);
        assert_eq!(amount + MinorUnit::new(300), MinorUnit::new(1300));
        assert_eq!(amount - MinorUnit::new(200), MinorUnit::new(800));
        assert_eq!(MinorUnit::new(200) - amount, MinorUnit::new(-800));
        assert!((MinorUnit::new(200) - amount).is_negative());
    }

    #[test]
    fn saturating_sub_floors_at_zero() {
        assert_eq!(
            MinorUnit::new(100).saturating_sub(MinorUnit::new(500)),
            MinorUnit::zero()
        );
    }
}
