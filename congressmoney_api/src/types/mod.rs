mod senator;
pub use self::senator::{RawTransaction, Senator, TxKind, NO_TICKER};

mod price;
pub use self::price::{DailyAdjustedResponse, DailyBar, DailyMeta};
