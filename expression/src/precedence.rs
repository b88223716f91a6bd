use serde::{Deserialize, Serialize};

#[derive(
    Debug, PartialOrd, Ord, PartialEq, Eq, Clone, Copy, Serialize, Deserialize,
)]
pub enum Precedence {
    NONE = 0,
    CONDITIONAL = 1,
    NULLISH = 2,
    OR = 3,
    AND = 4,
    EQUALITY = 5,
    COMPARE = 6,
    SUM = 7,
    PRODUCT = 8,
    PREFIX = 9,
    POSTFIX = 10,
}
