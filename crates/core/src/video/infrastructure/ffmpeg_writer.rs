use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::Rational;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// Intermediate codec for redacted output.
///
/// Both decode everywhere; distribution-grade re-encoding happens downstream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputCodec {
    /// Motion JPEG, intra-only. Larger files, no inter-frame artifacts.
    #[default]
    Mjpeg,
    Mpeg4,
}

impl OutputCodec {
    fn codec_id(self) -> ffmpeg_next::codec::Id {
        match self {
            OutputCodec::Mjpeg => ffmpeg_next::codec::Id::MJPEG,
            OutputCodec::Mpeg4 => ffmpeg_next::codec::Id::MPEG4,
        }
    }

    fn pixel_format(self) -> Pixel {
        match self {
            OutputCodec::Mjpeg => Pixel::YUVJ420P,
            OutputCodec::Mpeg4 => Pixel::YUV420P,
        }
    }

    /// Container extension the codec is usually paired with.
    pub fn default_extension(self) -> &'static str {
        match self {
            OutputCodec::Mjpeg => "avi",
            OutputCodec::Mpeg4 => "mp4",
        }
    }
}

impl fmt::Display for OutputCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputCodec::Mjpeg => write!(f, "mjpeg"),
            OutputCodec::Mpeg4 => write!(f, "mpeg4"),
        }
    }
}

impl FromStr for OutputCodec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mjpeg" | "mjpg" => Ok(OutputCodec::Mjpeg),
            "mpeg4" | "mp4v" => Ok(OutputCodec::Mpeg4),
            other => Err(format!("codec must be 'mjpeg' or 'mpeg4', got '{other}'")),
        }
    }
}

/// Encodes RGB24 frames via ffmpeg-next. Video only; no audio is carried over.
pub struct FfmpegWriter {
    codec: OutputCodec,
    state: Option<EncoderState>,
}

struct EncoderState {
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    frame_rate: i32,
    stream_time_base: Rational,
    frames_written: usize,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new(codec: OutputCodec) -> Self {
        Self { codec, state: None }
    }

    pub fn codec(&self) -> OutputCodec {
        self.codec
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new(OutputCodec::default())
    }
}

impl EncoderState {
    /// Moves every packet the encoder has ready into the container.
    fn drain_packets(&mut self) -> Result<(), ffmpeg_next::Error> {
        let mut packet = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(0);
            packet.rescale_ts(Rational(1, self.frame_rate), self.stream_time_base);
            packet.write_interleaved(&mut self.octx)?;
        }
        Ok(())
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut octx = ffmpeg_next::format::output(path)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(self.codec.codec_id())
            .ok_or_else(|| format!("{} encoder not available", self.codec))?;
        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        let frame_rate = (metadata.fps.round() as i32).max(1);
        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(self.codec.pixel_format());
        encoder_ctx.set_time_base(Rational(1, frame_rate));
        encoder_ctx.set_frame_rate(Some(Rational(frame_rate, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);
        octx.write_header()?;

        // The muxer may pick its own time base while writing the header.
        let stream_time_base = octx
            .stream(0)
            .ok_or("output stream missing after header")?
            .time_base();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            Pixel::RGB24,
            metadata.width,
            metadata.height,
            self.codec.pixel_format(),
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "Opened {} for writing: {}x{} @ {frame_rate} fps, {}",
            path.display(),
            metadata.width,
            metadata.height,
            self.codec
        );

        self.state = Some(EncoderState {
            octx,
            encoder,
            scaler,
            width: metadata.width,
            height: metadata.height,
            frame_rate,
            stream_time_base,
            frames_written: 0,
        });
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let state = self.state.as_mut().ok_or("FfmpegWriter: not opened")?;
        if frame.width() != state.width || frame.height() != state.height || frame.channels() != 3
        {
            return Err(format!(
                "frame is {}x{}x{}, encoder expects {}x{}x3",
                frame.width(),
                frame.height(),
                frame.channels(),
                state.width,
                state.height
            )
            .into());
        }

        let mut rgb = ffmpeg_next::util::frame::video::Video::new(
            Pixel::RGB24,
            state.width,
            state.height,
        );
        let row_bytes = state.width as usize * 3;
        let stride = rgb.stride(0);
        for (src, dst) in frame
            .data()
            .chunks_exact(row_bytes)
            .zip(rgb.data_mut(0).chunks_mut(stride))
        {
            dst[..row_bytes].copy_from_slice(src);
        }

        let mut yuv = ffmpeg_next::util::frame::video::Video::empty();
        state.scaler.run(&rgb, &mut yuv)?;
        yuv.set_pts(Some(state.frames_written as i64));

        state.encoder.send_frame(&yuv)?;
        state.drain_packets()?;
        state.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(mut state) = self.state.take() else {
            return Ok(());
        };
        state.encoder.send_eof()?;
        state.drain_packets()?;
        state.octx.write_trailer()?;
        log::debug!("Closed output after {} frames", state.frames_written);
        Ok(())
    }
}
