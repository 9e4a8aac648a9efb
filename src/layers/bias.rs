//! Bias-add layer.

use burn::{
    module::{Ignored, Module, Param},
    tensor::{Tensor, backend::Backend},
};
use serde::{Deserialize, Serialize};

use crate::errors::{ExportError, LayerError};
use crate::hdl::{self, Instantiation, WORD_BITS};
use crate::layers::{Layer, LayerKind, LayerParameters};
use crate::quantize::{QuantRange, Quantization, Quantizer, validate_bit_width};

/// Width of a bias sum before requantization.
const SUM_BITS: u32 = WORD_BITS + 1;

/// Configuration for a [`BiasLayer`].
#[derive(Debug, Clone)]
pub struct BiasConfig {
    /// Unique layer name, also used to name the bias wire.
    pub name: String,
    /// Number of channels. Should match the kernel count of the layer before it.
    pub size: usize,
    /// Value every bias starts at. Positive so following ReLUs rarely clamp.
    pub initial_value: f32,
}

impl BiasConfig {
    /// Creates a new BiasConfig with biases initialised to 0.1.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            initial_value: 0.1,
        }
    }

    /// Sets the initial bias value.
    pub fn with_initial_value(mut self, value: f32) -> Self {
        self.initial_value = value;
        self
    }

    /// Initializes the layer on the given device.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<BiasLayer<B>, LayerError> {
        if self.size == 0 {
            return Err(LayerError::InvalidSize {
                name: self.name.clone(),
            });
        }

        let bias = Tensor::<B, 1>::full([self.size], self.initial_value, device);

        Ok(BiasLayer {
            bias: Param::from_tensor(bias),
            size: self.size,
            state: Ignored(BiasState {
                name: self.name.clone(),
                ..BiasState::default()
            }),
        })
    }
}

/// Quantized biases together with the grid they were quantized onto.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedBias {
    pub values: Vec<i32>,
    pub range: QuantRange,
    pub bit_width: u32,
}

/// Host-side snapshot of the bias layer, taken by
/// [`BiasLayer::save_parameters`] and consumed by export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasParameters {
    pub bias: Vec<f32>,
    pub bias_q: Vec<i32>,
    pub bit_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rescale_shift: Option<i32>,
}

/// Quantization bookkeeping of a [`BiasLayer`]. Not part of the module record.
#[derive(Debug, Clone, Default)]
pub struct BiasState {
    name: String,
    quantized: Quantization<QuantizedBias>,
    input_q_range: Option<f32>,
    output_q_range: Option<f32>,
    rescale_factor: Option<f32>,
    saved: Option<BiasParameters>,
}

/// Adds a learnable per-channel offset to its input.
///
/// The layer goes through three phases: floating point training, quantization
/// against `input_q_range`, and export to a `bias` + `requantize_9bit` pair of
/// Verilog modules.
#[derive(Module, Debug)]
pub struct BiasLayer<B: Backend> {
    /// The learnable biases.
    bias: Param<Tensor<B, 1>>,
    /// Number of channels (constant metadata).
    size: usize,
    state: Ignored<BiasState>,
}

impl<B: Backend> BiasLayer<B> {
    /// Returns the floating point biases.
    pub fn bias(&self) -> Tensor<B, 1> {
        self.bias.val()
    }

    /// Returns the learnable parameter.
    pub fn param(&self) -> &Param<Tensor<B, 1>> {
        &self.bias
    }

    /// Replaces the float biases, e.g. with values from a trained checkpoint.
    ///
    /// The parameter keeps its id, so optimizer state and records still
    /// refer to it. Quantized state is left untouched until the next
    /// `quantize`.
    pub fn set_bias(&mut self, values: &[f32]) -> Result<(), LayerError> {
        if values.len() != self.size {
            return Err(LayerError::ShapeMismatch {
                expected: self.size,
                actual: values.len(),
            });
        }
        let device = self.bias.val().device();
        let tensor = Tensor::<B, 1>::from_floats(values, &device);
        self.bias = self.bias.clone().map(|_| tensor.require_grad());
        Ok(())
    }

    /// Returns the quantized state.
    pub fn quantized(&self) -> &Quantization<QuantizedBias> {
        &self.state.0.quantized
    }

    /// Name of the wire holding the constant biases in the exported design.
    pub fn bias_wire_name(&self) -> String {
        format!("{}_bias", self.state.0.name)
    }

    pub fn input_q_range(&self) -> Option<f32> {
        self.state.0.input_q_range
    }

    pub fn output_q_range(&self) -> Option<f32> {
        self.state.0.output_q_range
    }

    pub fn rescale_factor(&self) -> Option<f32> {
        self.state.0.rescale_factor
    }

    /// Parameters captured by the last call to `save_parameters`.
    pub fn saved_parameters(&self) -> Option<&BiasParameters> {
        self.state.0.saved.as_ref()
    }

    /// Performs the floating point forward pass: `input + bias` broadcast
    /// over the trailing dimension.
    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> Result<Tensor<B, D>, LayerError> {
        self.check_channels(&input)?;
        Ok(input + self.bias.val().unsqueeze::<D>())
    }

    /// Performs the forward pass with quantized biases. `input` should
    /// already be quantized onto the same grid.
    pub fn forward_quantized<const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Result<Tensor<B, D>, LayerError> {
        let quantized = self.quantized().require(self.name())?;
        self.check_channels(&input)?;

        let values: Vec<f32> = quantized.values.iter().map(|&v| v as f32).collect();
        let bias_q = Tensor::<B, 1>::from_floats(values.as_slice(), &input.device());
        Ok(input + bias_q.unsqueeze::<D>())
    }

    fn check_channels<const D: usize>(&self, input: &Tensor<B, D>) -> Result<(), LayerError> {
        let actual = input.dims().last().copied().unwrap_or(0);
        if actual != self.size {
            return Err(LayerError::ShapeMismatch {
                expected: self.size,
                actual,
            });
        }
        Ok(())
    }

    /// Records the magnitude of the symmetric input quantization range.
    pub fn set_input_range(&mut self, magnitude: f32) -> Result<(), LayerError> {
        QuantRange::symmetric(magnitude)?;
        self.state.0.input_q_range = Some(magnitude);
        Ok(())
    }

    /// Sets `output_q_range` to twice the input range: adding two values of
    /// the same range can double the magnitude.
    pub fn set_output_range(&mut self) -> Result<f32, LayerError> {
        let output = self.require_input_range()? * 2.0;
        self.state.0.output_q_range = Some(output);
        Ok(output)
    }

    /// Assigns the shift applied by the requantization stage after this layer.
    pub fn set_rescale_factor(&mut self, factor: f32) {
        self.state.0.rescale_factor = Some(factor);
    }

    fn require_input_range(&self) -> Result<f32, LayerError> {
        self.state
            .0
            .input_q_range
            .ok_or_else(|| LayerError::MissingInputRange {
                name: self.state.0.name.clone(),
            })
    }

    /// Quantizes the biases over `[-input_q_range, input_q_range]`.
    ///
    /// Calling this again replaces the previous quantized state and discards
    /// any saved parameters.
    pub fn quantize<Q: Quantizer>(
        &mut self,
        quantizer: &Q,
        bit_width: u32,
    ) -> Result<(), LayerError> {
        let bit_width = validate_bit_width(bit_width)?;
        let range = QuantRange::symmetric(self.require_input_range()?)?;
        let values: Vec<f32> = quantizer
            .quantize(self.bias.val(), range, bit_width)?
            .to_data()
            .to_vec()
            .map_err(LayerError::data)?;

        log::debug!(
            "Quantized bias layer `{}` to {} bits over [{}, {}]",
            self.name(),
            bit_width,
            range.min,
            range.max
        );

        let state = &mut self.state.0;
        state.quantized = Quantization::Quantized(QuantizedBias {
            values: values.into_iter().map(|v| v.round() as i32).collect(),
            range,
            bit_width,
        });
        state.saved = None;
        Ok(())
    }

    /// Evaluates the float and quantized biases, plus the rescale factor if
    /// one was assigned, into host vectors used by export.
    pub fn save_parameters(&mut self) -> Result<&BiasParameters, LayerError> {
        let bias: Vec<f32> = self
            .bias
            .val()
            .to_data()
            .to_vec()
            .map_err(LayerError::data)?;

        let state = &mut self.state.0;
        let quantized = state.quantized.require(&state.name)?;
        let params = BiasParameters {
            bias,
            bias_q: quantized.values.clone(),
            bit_width: quantized.bit_width,
            rescale_shift: state.rescale_factor.map(|f| f.trunc() as i32),
        };

        log::debug!("Saved parameters of bias layer `{}`", state.name);

        Ok(state.saved.insert(params))
    }

    /// Output bitwidth (log2 of the largest magnitude) given the input
    /// bitwidth. Addition grows the value range by one bit.
    pub fn bitwidth_change(&self, bw_in: f32) -> f32 {
        bw_in + 1.0
    }

    /// Declares the bias wire and assigns the saved quantized biases to it.
    pub fn write_bias_wire(&self) -> Result<String, LayerError> {
        let params = self.require_saved()?;
        let wire = self.bias_wire_name();
        hdl::identifier(&wire)?;

        let values: Vec<i64> = params.bias_q.iter().map(|&v| i64::from(v)).collect();
        let mut text = hdl::wire_declaration(WORD_BITS, self.size, &wire);
        text.push_str(&hdl::constant_vector(&wire, &values)?);
        Ok(text)
    }

    /// Instantiates the `bias` adder followed by `requantize_9bit`.
    pub fn write_inst(
        &self,
        instance: &str,
        in_wire: &str,
        out_wire: &str,
    ) -> Result<String, LayerError> {
        let params = self.require_saved()?;
        let shift = params
            .rescale_shift
            .ok_or_else(|| ExportError::MissingRescaleFactor {
                name: self.name().to_string(),
            })?;
        hdl::identifier(in_wire)?;
        hdl::identifier(out_wire)?;

        let sum_wire = format!("wire9_{in_wire}");

        let mut text = hdl::wire_declaration(SUM_BITS, self.size, &sum_wire);
        text.push_str(&hdl::wire_declaration(WORD_BITS, self.out_port_width(), out_wire));

        let adder = Instantiation::new("bias", instance)
            .param("SIZE", self.size)
            .clocked()
            .port("a", in_wire)
            .port("b", self.bias_wire_name())
            .port("sum", &sum_wire);
        text.push_str(&adder.render()?);

        let requantize = Instantiation::new("requantize_9bit", format!("rq_inst_{in_wire}"))
            .param("SHIFT", shift)
            .param("SIZE", self.size)
            .clocked()
            .port("pixel_in", &sum_wire)
            .port("pixel_out", out_wire)
            .port_indent(5);
        text.push_str(&requantize.render()?);

        Ok(text)
    }

    /// Exports the layer as Verilog: the constant bias wire followed by the
    /// module instantiations.
    ///
    /// Requires `quantize` and `save_parameters` to have run; export never
    /// quantizes on its own.
    pub fn export(
        &self,
        instance: &str,
        in_wire: &str,
        out_wire: &str,
    ) -> Result<String, LayerError> {
        let mut text = self.write_bias_wire()?;
        text.push('\n');
        text.push_str(&self.write_inst(instance, in_wire, out_wire)?);

        log::info!("Exported bias layer `{}` as `{}`", self.name(), instance);
        Ok(text)
    }

    fn require_saved(&self) -> Result<&BiasParameters, LayerError> {
        let state = &self.state.0;
        state.quantized.require(&state.name)?;
        state
            .saved
            .as_ref()
            .ok_or_else(|| LayerError::ParametersNotSaved {
                name: state.name.clone(),
            })
    }
}

impl<B: Backend> Layer for BiasLayer<B> {
    fn name(&self) -> &str {
        &self.state.0.name
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Bias
    }

    fn size(&self) -> usize {
        self.size
    }

    fn is_quantized(&self) -> bool {
        self.state.0.quantized.is_quantized()
    }

    fn parameters(&self) -> Option<LayerParameters> {
        self.state.0.saved.clone().map(LayerParameters::Bias)
    }
}
