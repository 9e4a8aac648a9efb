//! Rectified linear activation layer.

use burn::{
    module::{Ignored, Module},
    tensor::{Tensor, activation, backend::Backend},
};
use serde::{Deserialize, Serialize};

use crate::errors::LayerError;
use crate::hdl::{self, Instantiation, WORD_BITS};
use crate::layers::{Layer, LayerKind, LayerParameters};
use crate::quantize::{QuantRange, Quantization, Quantizer, validate_bit_width};

/// Configuration for a [`ReluLayer`].
#[derive(Debug, Clone)]
pub struct ReluConfig {
    /// Unique layer name.
    pub name: String,
    /// Number of ReLU units.
    pub size: usize,
    /// Largest quantized output value.
    pub q_max: i32,
    /// Smallest quantized output value.
    pub q_min: i32,
}

impl ReluConfig {
    /// Creates a new ReluConfig with the signed 8-bit bounds.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            q_max: i32::from(i8::MAX),
            q_min: i32::from(i8::MIN),
        }
    }

    /// Sets the quantized output bounds.
    pub fn with_q_bounds(mut self, q_min: i32, q_max: i32) -> Self {
        self.q_min = q_min;
        self.q_max = q_max;
        self
    }

    /// Initializes the layer on the given device.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<ReluLayer<B>, LayerError> {
        if self.size == 0 {
            return Err(LayerError::InvalidSize {
                name: self.name.clone(),
            });
        }

        Ok(ReluLayer {
            zero: Tensor::zeros([1], device),
            size: self.size,
            state: Ignored(ReluState {
                name: self.name.clone(),
                q_max: self.q_max,
                q_min: self.q_min,
                quantized: Quantization::Unquantized,
                output_q_range: None,
                saved: None,
            }),
        })
    }
}

/// The quantized encoding of 0.0 for the layer's input grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizedZero {
    pub value: i32,
    pub range: QuantRange,
    pub bit_width: u32,
}

/// Parameters exported for a quantized ReLU layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReluParameters {
    pub zero_q: i32,
    pub q_min: i32,
    pub q_max: i32,
    pub bit_width: u32,
}

#[derive(Debug, Clone)]
pub struct ReluState {
    name: String,
    q_max: i32,
    q_min: i32,
    quantized: Quantization<QuantizedZero>,
    output_q_range: Option<QuantRange>,
    saved: Option<ReluParameters>,
}

/// Rectified linear activation for float and quantized values.
#[derive(Module, Debug)]
pub struct ReluLayer<B: Backend> {
    /// Value of zero relative to the input. Quantized ops see its encoding.
    zero: Tensor<B, 1>,
    size: usize,
    state: Ignored<ReluState>,
}

impl<B: Backend> ReluLayer<B> {
    pub fn q_max(&self) -> i32 {
        self.state.0.q_max
    }

    pub fn q_min(&self) -> i32 {
        self.state.0.q_min
    }

    pub fn quantized(&self) -> &Quantization<QuantizedZero> {
        &self.state.0.quantized
    }

    pub fn output_q_range(&self) -> Option<QuantRange> {
        self.state.0.output_q_range
    }

    /// Parameters captured by the last call to `save_parameters`.
    pub fn saved_parameters(&self) -> Option<&ReluParameters> {
        self.state.0.saved.as_ref()
    }

    /// Computes `max(input, 0)` elementwise.
    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        activation::relu(input)
    }

    /// Quantized ReLU.
    ///
    /// Rectifies at 0, which is only correct when zero quantizes to 0
    /// (symmetric signed grids). Any other zero point is rejected instead of
    /// producing silently wrong activations.
    pub fn forward_quantized<const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Result<Tensor<B, D>, LayerError> {
        let zero = self.quantized().require(self.name())?;
        if zero.value != 0 {
            return Err(LayerError::NonZeroQuantizedZero {
                name: self.name().to_string(),
                zero: zero.value,
            });
        }
        Ok(activation::relu(input))
    }

    /// Quantizes the zero reference onto `[mn, mx]` with `bit_width` bits.
    ///
    /// Discards parameters saved against a previous grid.
    pub fn quantize<Q: Quantizer>(
        &mut self,
        quantizer: &Q,
        mn: f32,
        mx: f32,
        bit_width: u32,
    ) -> Result<(), LayerError> {
        let bit_width = validate_bit_width(bit_width)?;
        let range = QuantRange::new(mn, mx)?;
        let encoded: Vec<f32> = quantizer
            .quantize(self.zero.clone(), range, bit_width)?
            .to_data()
            .to_vec()
            .map_err(LayerError::data)?;

        let state = &mut self.state.0;
        let value = encoded
            .first()
            .copied()
            .ok_or_else(|| LayerError::Quantize {
                message: format!("quantizer returned no value for layer `{}`", state.name),
            })?;

        log::debug!(
            "Quantized relu layer `{}`: zero -> {} over [{}, {}]",
            state.name,
            value,
            mn,
            mx
        );

        state.quantized = Quantization::Quantized(QuantizedZero {
            value: value.round() as i32,
            range,
            bit_width,
        });
        state.output_q_range = Some(range);
        state.saved = None;
        Ok(())
    }

    /// Captures the quantized zero and output bounds. The layer has no
    /// learnable state, so this is all export and `parameters` report.
    pub fn save_parameters(&mut self) -> Result<&ReluParameters, LayerError> {
        let state = &mut self.state.0;
        let zero = state.quantized.require(&state.name)?;
        let params = ReluParameters {
            zero_q: zero.value,
            q_min: state.q_min,
            q_max: state.q_max,
            bit_width: zero.bit_width,
        };

        log::debug!("Saved parameters of relu layer `{}`", state.name);

        Ok(state.saved.insert(params))
    }

    /// Instantiates the `relu` module between two slices of the `wire8` bus.
    pub fn export(
        &self,
        instance: &str,
        in_index: usize,
        out_index: usize,
    ) -> Result<String, LayerError> {
        let zero = self.quantized().require(self.name())?;
        let zero_bits = hdl::to_unsigned(i64::from(zero.value), WORD_BITS)?;
        let zero_literal = hdl::sized_decimal(WORD_BITS, zero_bits);

        let mut text = Instantiation::new("relu", instance)
            .param("SIZE", self.size)
            .trailing_param_comma(true)
            .clocked()
            .port("zero", zero_literal)
            .port("in", format!("wire8[{in_index}]"))
            .port("out", format!("wire8[{out_index}]"))
            .render()?;
        text.push('\n');

        log::info!("Exported relu layer `{}` as `{}`", self.name(), instance);
        Ok(text)
    }
}

impl<B: Backend> Layer for ReluLayer<B> {
    fn name(&self) -> &str {
        &self.state.0.name
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Relu
    }

    fn size(&self) -> usize {
        self.size
    }

    fn is_quantized(&self) -> bool {
        self.state.0.quantized.is_quantized()
    }

    fn parameters(&self) -> Option<LayerParameters> {
        self.state.0.saved.clone().map(LayerParameters::Relu)
    }
}
