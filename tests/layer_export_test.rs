//! Integration tests running bias and ReLU layers through the full
//! float -> quantize -> save -> export flow and checking the exact Verilog.

use burn::backend::NdArray;
use burn::tensor::{Tensor, backend::Backend};
use hwlayers::export::{ParametersExport, collect_parameters, export_parameters};
use hwlayers::prelude::*;

type TestBackend = NdArray;

const TOLERANCE: f32 = 1e-6;

fn floats_close(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() < tolerance
}

fn to_vec<const D: usize>(tensor: Tensor<TestBackend, D>) -> Vec<f32> {
    tensor.to_data().to_vec().unwrap()
}

fn quantized_bias(device: &<TestBackend as Backend>::Device) -> BiasLayer<TestBackend> {
    let mut bias: BiasLayer<TestBackend> = BiasConfig::new("conv1", 3)
        .init(device)
        .expect("Layer build should succeed");
    // Quantize to [-5, 10, 0] over [-1, 1] at 8 bits
    bias.set_bias(&[-0.04, 0.08, 0.0]).unwrap();
    bias.set_input_range(1.0).unwrap();
    bias.quantize(&LinearQuantizer, 8).unwrap();
    bias
}

#[test]
fn test_bias_export_matches_legacy_text() {
    let device = <TestBackend as Backend>::Device::default();
    let mut bias = quantized_bias(&device);
    bias.set_rescale_factor(1.0);
    let params = bias.save_parameters().unwrap();
    assert_eq!(params.bias_q, vec![-5, 10, 0]);

    let text = bias
        .export("bias_1", "conv1_out", "bias1_out")
        .expect("Export should succeed");

    let expected = "wire [8*3-1:0] conv1_bias;
assign conv1_bias = { 8'd0, 8'd10, 8'd251};
wire [9*3-1:0] wire9_conv1_out;
wire [8*3-1:0] bias1_out;

  bias #(
    .SIZE(3)
  )
  bias_1 (
    .clock(clock),
    .reset(reset),
    .a(conv1_out),
    .b(conv1_bias),
    .sum(wire9_conv1_out)
  );

  requantize_9bit #(
    .SHIFT(1),
    .SIZE(3)
  )
  rq_inst_conv1_out (
     .clock(clock),
     .reset(reset),
     .pixel_in(wire9_conv1_out),
     .pixel_out(bias1_out)
  );
";
    assert_eq!(text, expected);
}

#[test]
fn test_relu_export_matches_legacy_text() {
    let device = <TestBackend as Backend>::Device::default();
    let mut relu: ReluLayer<TestBackend> = ReluConfig::new("relu1", 16)
        .init(&device)
        .expect("Layer build should succeed");
    relu.quantize(&LinearQuantizer, -4.0, 4.0, 8).unwrap();

    let text = relu.export("relu_1", 0, 1).unwrap();
    let expected = "
  relu #(
    .SIZE(16),
  )
  relu_1 (
    .clock(clock),
    .reset(reset),
    .zero(8'd0),
    .in(wire8[0]),
    .out(wire8[1])
  );

";
    assert_eq!(text, expected);
}

#[test]
fn test_export_requires_quantization() {
    let device = <TestBackend as Backend>::Device::default();
    let bias: BiasLayer<TestBackend> = BiasConfig::new("conv1", 3).init(&device).unwrap();
    let relu: ReluLayer<TestBackend> = ReluConfig::new("relu1", 3).init(&device).unwrap();

    match bias.export("bias_1", "a", "b") {
        Err(LayerError::NotQuantized { name }) => assert_eq!(name, "conv1"),
        other => panic!("unexpected result: {:?}", other),
    }
    match relu.export("relu_1", 0, 1) {
        Err(LayerError::NotQuantized { name }) => assert_eq!(name, "relu1"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_float_and_quantized_pipelines() {
    let device = <TestBackend as Backend>::Device::default();
    let mut bias = quantized_bias(&device);
    let mut relu: ReluLayer<TestBackend> = ReluConfig::new("relu1", 3).init(&device).unwrap();

    let input =
        Tensor::<TestBackend, 2>::from_floats([[0.5, -0.5, 0.0], [0.01, 0.02, -0.03]], &device);
    let output = relu.forward(bias.forward(input).unwrap());

    let expected = [0.46, 0.0, 0.0, 0.0, 0.1, 0.0];
    for (got, want) in to_vec(output).iter().zip(expected.iter()) {
        assert!(
            floats_close(*got, *want, TOLERANCE),
            "Mismatch: got={}, want={}",
            got,
            want
        );
    }

    let output_range = bias.set_output_range().unwrap();
    assert_eq!(output_range, 2.0);
    relu.quantize(&LinearQuantizer, -output_range, output_range, 8).unwrap();

    let input_q = Tensor::<TestBackend, 2>::from_floats([[3.0, -20.0, 7.0]], &device);
    let output_q = relu
        .forward_quantized(bias.forward_quantized(input_q).unwrap())
        .unwrap();
    assert_eq!(to_vec(output_q), vec![0.0, 0.0, 7.0]);
}

#[test]
fn test_parameter_export_roundtrip() {
    let device = <TestBackend as Backend>::Device::default();
    let mut bias = quantized_bias(&device);
    bias.set_rescale_factor(2.0);
    bias.save_parameters().unwrap();

    let mut relu: ReluLayer<TestBackend> = ReluConfig::new("relu1", 3).init(&device).unwrap();
    relu.quantize(&LinearQuantizer, -2.0, 2.0, 8).unwrap();
    relu.save_parameters().expect("Save should succeed");

    let json = export_parameters(&[&bias, &relu]).expect("Export should succeed");
    let parsed: ParametersExport = serde_json::from_str(&json).expect("JSON should be valid");

    assert_eq!(parsed, collect_parameters(&[&bias, &relu]));
    assert_eq!(parsed.layers[0].kind, LayerKind::Bias);
    match &parsed.layers[0].parameters {
        Some(LayerParameters::Bias(params)) => {
            assert_eq!(params.bias_q, vec![-5, 10, 0]);
            assert_eq!(params.rescale_shift, Some(2));
        }
        other => panic!("unexpected parameters: {:?}", other),
    }
    match &parsed.layers[1].parameters {
        Some(LayerParameters::Relu(params)) => assert_eq!(params.zero_q, 0),
        other => panic!("unexpected parameters: {:?}", other),
    }
}
