//! Network fee estimation: VM gas quote plus a size surcharge

use super::transaction::InvocationTransaction;
use crate::error::{RelayerError, RelayerResult};
use crate::rpc::RpcClient;
use crate::types::Fixed8;

use tracing::debug;

/// Gas every invocation gets for free
pub const FREE_GAS: Fixed8 = Fixed8::from_units(10);
/// Transactions larger than this many bytes pay the size surcharge
pub const SIZE_THRESHOLD: usize = 1024;
/// Flat part of the size surcharge (0.001)
pub const SIZE_BASE_FEE: Fixed8 = Fixed8::from_raw(100_000);
/// Per-byte part of the size surcharge (0.00001)
pub const FEE_PER_BYTE: Fixed8 = Fixed8::from_raw(1_000);

/// Fee estimator for invocation transactions
pub struct FeeEstimator {
    free_gas: Fixed8,
    size_threshold: usize,
    size_base_fee: Fixed8,
    fee_per_byte: Fixed8,
}

impl FeeEstimator {
    pub fn new() -> Self {
        Self {
            free_gas: FREE_GAS,
            size_threshold: SIZE_THRESHOLD,
            size_base_fee: SIZE_BASE_FEE,
            fee_per_byte: FEE_PER_BYTE,
        }
    }

    /// Gas fee for a quoted consumption: the part above the free allowance,
    /// rounded up to a whole unit
    pub fn gas_fee_from_quote(&self, gas_consumed: &str) -> RelayerResult<Fixed8> {
        let consumed: Fixed8 = gas_consumed.parse()?;
        let out_of_range =
            || RelayerError::Parse(format!("gas quote {:?} out of range", gas_consumed));
        let gas = consumed
            .checked_sub(self.free_gas)
            .ok_or_else(out_of_range)?;
        if gas <= Fixed8::ZERO {
            Ok(Fixed8::ZERO)
        } else {
            gas.checked_ceiling().ok_or_else(out_of_range)
        }
    }

    /// Ask the node to run `script` and price the result
    pub async fn gas_fee(&self, client: &RpcClient, script: &[u8]) -> RelayerResult<Fixed8> {
        let quote = client.invoke_script(script).await?;
        let fee = self.gas_fee_from_quote(&quote.gas_consumed)?;
        debug!(
            "Gas quote {} (state {}) -> gas fee {}",
            quote.gas_consumed, quote.state, fee
        );
        Ok(fee)
    }

    pub fn size_surcharge(&self, size: usize) -> Fixed8 {
        if size > self.size_threshold {
            self.size_base_fee + Fixed8::from_raw(self.fee_per_byte.raw() * size as i64)
        } else {
            Fixed8::ZERO
        }
    }

    /// Total fee for `tx`, writing the gas portion into `tx.gas`
    ///
    /// The size is taken once from the draft as it stands (script and gas
    /// only); inputs, outputs and witnesses added later are not re-priced.
    pub async fn estimate_fee(
        &self,
        client: &RpcClient,
        tx: &mut InvocationTransaction,
    ) -> RelayerResult<Fixed8> {
        tx.gas = self.gas_fee(client, &tx.script).await?;

        let size = tx.size();
        let surcharge = self.size_surcharge(size);
        let fee = tx
            .gas
            .checked_add(surcharge)
            .ok_or_else(|| RelayerError::Parse(format!("fee {} + {} out of range", tx.gas, surcharge)))?;

        debug!(
            "Fee for {} byte draft: gas {} + size surcharge {} = {}",
            size, tx.gas, surcharge, fee
        );
        Ok(fee)
    }
}

impl Default for FeeEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::transport::MockTransport;

    fn client_quoting(gas_consumed: &'static str) -> RpcClient {
        let mut transport = MockTransport::new();
        transport.expect_post().times(1).returning(move |_| {
            Ok(format!(
                r#"{{"id":1,"jsonrpc":"2.0","result":{{"state":"HALT","gas_consumed":"{}","stack":[]}}}}"#,
                gas_consumed
            ))
        });
        RpcClient::new(Box::new(transport))
    }

    #[test]
    fn test_quote_within_free_allowance_is_free() {
        let estimator = FeeEstimator::new();
        assert_eq!(estimator.gas_fee_from_quote("0.126").unwrap(), Fixed8::ZERO);
        assert_eq!(estimator.gas_fee_from_quote("10").unwrap(), Fixed8::ZERO);
    }

    #[test]
    fn test_quote_above_allowance_rounds_up() {
        let estimator = FeeEstimator::new();
        assert_eq!(
            estimator.gas_fee_from_quote("10.00000001").unwrap(),
            Fixed8::from_units(1)
        );
        assert_eq!(
            estimator.gas_fee_from_quote("12.5").unwrap(),
            Fixed8::from_units(3)
        );
        assert_eq!(
            estimator.gas_fee_from_quote("13").unwrap(),
            Fixed8::from_units(3)
        );
    }

    #[test]
    fn test_unparseable_quote_is_parse_error() {
        let estimator = FeeEstimator::new();
        assert!(matches!(
            estimator.gas_fee_from_quote("lots"),
            Err(RelayerError::Parse(_))
        ));
    }

    #[test]
    fn test_out_of_range_quote_is_parse_error() {
        let estimator = FeeEstimator::new();
        // i64::MIN raw units minus the free allowance underflows
        assert!(matches!(
            estimator.gas_fee_from_quote("-92233720368.54775808"),
            Err(RelayerError::Parse(_))
        ));
    }

    #[test]
    fn test_size_surcharge_threshold() {
        let estimator = FeeEstimator::new();
        assert_eq!(estimator.size_surcharge(100), Fixed8::ZERO);
        assert_eq!(estimator.size_surcharge(1024), Fixed8::ZERO);
        // 0.001 + 1025 * 0.00001
        assert_eq!(
            estimator.size_surcharge(1025),
            "0.01125".parse::<Fixed8>().unwrap()
        );
        assert_eq!(
            estimator.size_surcharge(2000),
            "0.021".parse::<Fixed8>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_estimate_fee_sets_gas_on_small_draft() {
        let client = client_quoting("11.2");
        let mut tx = InvocationTransaction::new(vec![0x51; 40]);

        let fee = FeeEstimator::new().estimate_fee(&client, &mut tx).await.unwrap();
        assert_eq!(tx.gas, Fixed8::from_units(2));
        assert_eq!(fee, Fixed8::from_units(2));
    }

    #[tokio::test]
    async fn test_estimate_fee_adds_surcharge_for_large_script() {
        let client = client_quoting("1");
        let mut tx = InvocationTransaction::new(vec![0x51; 1100]);

        let fee = FeeEstimator::new().estimate_fee(&client, &mut tx).await.unwrap();
        let size = tx.size();
        assert!(size > SIZE_THRESHOLD);
        assert_eq!(tx.gas, Fixed8::ZERO);
        assert_eq!(
            fee,
            SIZE_BASE_FEE + Fixed8::from_raw(FEE_PER_BYTE.raw() * size as i64)
        );
    }
}
