//! Tests for the sum-statistics layer.
