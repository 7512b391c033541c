use crate::{Bar, PriceColumn, PriceSeries};

/// Rectangular, time-ordered table of numeric columns keyed by an ordinal (timestamp)
pub trait PriceTable {
    fn row_count(&self) -> usize;

    fn ordinal_at(&self, row: usize) -> f64;

    fn value_at(&self, row: usize, column: PriceColumn) -> f64;
}

impl PriceTable for PriceSeries {
    fn row_count(&self) -> usize {
        self.bars.len()
    }

    fn ordinal_at(&self, row: usize) -> f64 {
        self.bars[row].ordinal()
    }

    fn value_at(&self, row: usize, column: PriceColumn) -> f64 {
        self.bars[row].value(column)
    }
}

impl PriceTable for [Bar] {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn ordinal_at(&self, row: usize) -> f64 {
        self[row].ordinal()
    }

    fn value_at(&self, row: usize, column: PriceColumn) -> f64 {
        self[row].value(column)
    }
}
