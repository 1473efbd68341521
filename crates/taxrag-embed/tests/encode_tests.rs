use candle_core::{DType, Device, Tensor};
use taxrag_embed::mean_pool_normalized;

#[test]
fn pooling_ignores_masked_tokens() -> anyhow::Result<()> {
    let dev = Device::Cpu;
    // second token is padding
    let hidden = Tensor::from_slice(&[3.0f32, 0.0, 4.0, 0.0, 9.0, 9.0, 9.0, 9.0], (1, 2, 4), &dev)?;
    let mask = Tensor::from_slice(&[1u32, 0], (1, 2), &dev)?;
    let pooled: Vec<Vec<f32>> = mean_pool_normalized(&hidden, &mask)?.to_vec2()?;
    let expected = [0.6f32, 0.0, 0.8, 0.0];
    for (got, want) in pooled[0].iter().zip(expected) {
        assert!((got - want).abs() < 1e-5, "got {got}, want {want}");
    }
    Ok(())
}

#[test]
fn pooling_averages_over_batch_rows_independently() -> anyhow::Result<()> {
    let dev = Device::Cpu;
    let hidden = Tensor::from_slice(&[1.0f32, 0.0, 3.0, 0.0, 0.0, 2.0, 0.0, 2.0], (2, 2, 2), &dev)?;
    let mask = Tensor::ones((2, 2), DType::U32, &dev)?;
    let pooled: Vec<Vec<f32>> = mean_pool_normalized(&hidden, &mask)?.to_vec2()?;
    assert!((pooled[0][0] - 1.0).abs() < 1e-5);
    assert!((pooled[1][1] - 1.0).abs() < 1e-5);
    Ok(())
}

#[test]
fn pooling_rejects_rank_two_input() -> anyhow::Result<()> {
    let dev = Device::Cpu;
    let hidden = Tensor::zeros((2, 4), DType::F32, &dev)?;
    let mask = Tensor::ones((2, 1), DType::F32, &dev)?;
    assert!(mean_pool_normalized(&hidden, &mask).is_err());
    Ok(())
}
